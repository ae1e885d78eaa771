use thiserror::Error;

/// A failure local to one directive; the rest of the document still builds.
#[derive(Debug, Error)]
pub enum DirectiveError {
    #[error("\"{reference}\" is not of format \"module:command\"")]
    MalformedReference { reference: String },

    #[error("Failed to import \"{attribute}\" from \"{module}\". {detail}")]
    ImportFailed {
        module: String,
        attribute: String,
        detail: String,
    },

    #[error("Module \"{module}\" has no attribute \"{attribute}\"")]
    MissingAttribute { module: String, attribute: String },

    #[error("\"{type_name}\" of type \"{reference}\" is not a command")]
    NotACommand {
        reference: String,
        type_name: String,
    },

    #[error(":prog: must be specified")]
    MissingProg,

    #[error("':nested:' and ':show-nested:' are mutually exclusive")]
    ConflictingNested,

    #[error("{message}")]
    InvalidOptionValue { option: String, message: String },

    #[error("unknown option: \"{option}\"")]
    UnknownOption { option: String },

    #[error("duplicate target name \"{label}\" (already defined in \"{docname}\")")]
    DuplicateTarget { label: String, docname: String },
}
