use serde::Serialize;

/// The conventional set of predefined marker shapes.
/// Serialized by their wire name, so the frontend draws them from its own symbol table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SymbolPath {
    BackwardClosedArrow,
    BackwardOpenArrow,
    Circle,
    ForwardClosedArrow,
    ForwardOpenArrow,
}

static SYMBOL_TABLE: phf::OrderedMap<&'static str, SymbolPath> = phf::phf_ordered_map! {
    "BACKWARD_CLOSED_ARROW" => SymbolPath::BackwardClosedArrow,
    "BACKWARD_OPEN_ARROW" => SymbolPath::BackwardOpenArrow,
    "CIRCLE" => SymbolPath::Circle,
    "FORWARD_CLOSED_ARROW" => SymbolPath::ForwardClosedArrow,
    "FORWARD_OPEN_ARROW" => SymbolPath::ForwardOpenArrow,
};

impl SymbolPath {
    /// looks up the wire name of a symbol. names are case sensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        SYMBOL_TABLE.get(name).copied()
    }
    pub fn name(self) -> &'static str {
        match self {
            SymbolPath::BackwardClosedArrow => "BACKWARD_CLOSED_ARROW",
            SymbolPath::BackwardOpenArrow => "BACKWARD_OPEN_ARROW",
            SymbolPath::Circle => "CIRCLE",
            SymbolPath::ForwardClosedArrow => "FORWARD_CLOSED_ARROW",
            SymbolPath::ForwardOpenArrow => "FORWARD_OPEN_ARROW",
        }
    }
    pub fn all() -> impl Iterator<Item = SymbolPath> {
        SYMBOL_TABLE.values().copied()
    }
}

impl std::fmt::Display for SymbolPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
