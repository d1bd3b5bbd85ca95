/// Stable identifier of a canonical catalog record.
/// Example: `3f1c2b8e-8d0a-4d5e-9b71-0c2f5a4b7e11`
pub type RecordId = String;
/// Rendered identifier of an input document, used to prefix diagnostics.
/// Examples: `9a0e...`, `<unsaved>` when the document has no `ID`
pub type DocumentLabel = String;
/// Name of a field inside a document or catalog record.
/// Examples: `Title`, `AlternateTitles`, `ISBN`
pub type FieldName = String;
/// Glob-like path pattern over a document tree.
/// Examples: `**.Source`, `Parts.*.Source`, `**._try_By`
pub type PatternString = String;
/// Normalized ISBN key used for catalog lookups.
/// Examples: `0398522331`, `9780140449136`
pub type IsbnKey = String;
