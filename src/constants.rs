/// Field names read from input documents and source descriptors.
pub mod fields {
    /// Stable identifier on documents, descriptors, and catalog records.
    pub const ID: &str = "ID";
    /// Record category tag (`work` for match candidates).
    pub const CATEGORY: &str = "Category";
    /// Attribution field.
    pub const BY: &str = "By";
    /// External link; descriptors carrying one are not resolvable here.
    pub const URL: &str = "URL";
    /// ISBN-like key, searched at any depth below a descriptor.
    pub const ISBN: &str = "ISBN";
    /// Work title.
    pub const TITLE: &str = "Title";
    /// Alternate titles on canonical records.
    pub const ALTERNATE_TITLES: &str = "AlternateTitles";
    /// Media designation on canonical records.
    pub const MEDIA: &str = "Media";
    /// Segment name that marks a source descriptor.
    pub const SOURCE: &str = "Source";
    /// Transient attribution hint attached while one descriptor is matched.
    pub const TRY_BY: &str = "_try_By";
}

/// Path patterns used by the reconciler.
pub mod patterns {
    /// Default path separator.
    pub const SEPARATOR: char = '.';
    /// Recursive wildcard: zero or more levels.
    pub const RECURSIVE_WILDCARD: &str = "**";
    /// Single-level wildcard.
    pub const WILDCARD: &str = "*";
}

/// Catalog values used during matching.
pub mod catalog {
    /// Category required on title-match candidates.
    pub const WORK_CATEGORY: &str = "work";
    /// Media designation preferred when a title match is ambiguous.
    pub const PRIME_MEDIA: &str = "prime";
    /// Separator between field and value in a wire-form predicate.
    pub const PREDICATE_DELIMITER: char = '=';
    /// File extensions picked up when a catalog root is a directory.
    pub const RECORD_FILE_EXTENSIONS: [&str; 2] = ["json", "jsonl"];
}

/// Values used by the command-line runner.
pub mod apps {
    /// Environment variable consulted when `--catalog` is not given.
    pub const CATALOG_BASE_ENV: &str = "CATALOG_BASE";
    /// Log filter used when neither `RUST_LOG` nor `--log-level` is set.
    pub const DEFAULT_LOG_LEVEL: &str = "error";
    /// Label used for documents that carry no `ID`.
    pub const UNSAVED_DOCUMENT_LABEL: &str = "<unsaved>";
}

/// Structural fields that must hold a sequence or a string.
pub mod structure {
    /// Default structural fields checked by the validator.
    pub const DEFAULT_ARRAY_FIELDS: [&str; 3] = ["References", "SeeAlso", "Commentary"];
}
