pub mod cache;
pub mod config;
pub mod error;
pub mod index;
pub mod logging;
pub mod navigation;
pub mod parser;
pub mod process;
pub mod resolver;

pub use config::{MethodFilter, Provider, SessionConfig, Toolchain};
pub use error::{Result, TagscopeError};
pub use index::{IndexEvent, IndexManager, IndexState};
pub use navigation::NavigationService;
pub use parser::SymbolOccurrence;
pub use resolver::{LineSource, ResolvedLocation};
