// Document layer: text cleaning, the text extraction collaborator, and section segmentation.
// Everything downstream (skills, scoring, ranking) consumes a `ParsedDocument`.

pub mod clean;
pub mod extract;
pub mod sections;
