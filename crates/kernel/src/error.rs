use glade_common::ObjectId;

/// Errors from world and registry mutations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// Id collision on insert. Indicates a broken id-allocation invariant;
    /// the operation aborts instead of overwriting live state.
    #[error("duplicate object id {0:?}")]
    DuplicateId(ObjectId),
    /// A configured player capacity is reached. The caller may refuse the
    /// join and keep the world running.
    #[error("player capacity reached ({capacity})")]
    RegistryFull { capacity: usize },
    /// No factory registered for this kind string.
    #[error("unknown object kind {0:?}")]
    UnknownKind(String),
    #[error(transparent)]
    Object(#[from] ObjectError),
}

/// Errors raised by a single object's own serialize/deserialize/update.
///
/// These are local to one object: the tick loop logs and isolates them so
/// the rest of the world still advances.
#[derive(Debug, thiserror::Error)]
pub enum ObjectError {
    /// A payload did not have the shape this kind produces.
    #[error("bad {kind} payload: {detail}")]
    BadPayload { kind: &'static str, detail: String },
}
