use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Clone, Diagnostic, Error, PartialEq)]
pub enum MapError {
    /// the server and the map disagree on the symbol table. we refuse to draw a broken icon
    #[error("unknown symbol {symbol:?} on record {identity:?}")]
    #[diagnostic(
        code(map_error::unknown_symbol),
        help("the server must only send symbols from the map's symbol table")
    )]
    UnknownSymbol { identity: String, symbol: String },
}
