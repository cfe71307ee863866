/*!
 * Resource model carried by events.
 *
 * This module provides the in-memory representation of extracted content:
 * - Inline codes and coded text fragments
 * - Segmented text containers
 * - Text units, document parts and the structural start/end resources
 * - Id generation and the optional code simplifier
 */

pub mod code;
pub mod container;
pub mod fragment;
pub mod id;
pub mod letter_coded;
pub mod simplifier;
pub mod unit;

// Re-export types used by other modules
pub use code::{Code, TagType};
pub use container::{TextContainer, TextPart};
pub use fragment::TextFragment;
pub use id::IdGenerator;
pub use simplifier::{BoundaryPolicy, CodeSimplifier, SimplifierPolicy};
pub use unit::{
    DocumentPart, Ending, StartDocument, StartGroup, StartSubfilter, TextUnit,
};
