mod utils;

// public: bounding boxes
pub mod bounds;
// public: colours and pixel conversion
pub mod color;
// public: commandline parser
pub mod cli;
// public: time and frame cursors
pub mod context;
// public: error kinds and reporting
pub mod error;
// public: time-varying expressions
pub mod expr;
// public: `GeomNode` and the `Primitive` capabilities
pub mod geom;
// public: per-frame probe of a scene
pub mod probe;
// public: rays
pub mod ray;
// public: scene selection
pub mod scenes;
// public: intersection statistics
pub mod stats;
// public: surface properties
pub mod surface;
// public: textures and texture mappings
pub mod textures;
// public: transforms and transform chains
pub mod transform;

pub use utils::{equal, EPSILON};
