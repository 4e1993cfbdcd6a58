use crate::segments::domain::adjacency_graph::AdjacencyGraph;
use crate::segments::domain::selection::Selection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    Play,
    EditText,
    Concat,
}

impl MenuItem {
    pub fn label(&self) -> &'static str {
        match self {
            MenuItem::Play => "Play Region",
            MenuItem::EditText => "Edit Text",
            MenuItem::Concat => "Concat Regions",
        }
    }
}

/// Items offered when a region is right-clicked.
pub fn menu_items(selection: &Selection, graph: &AdjacencyGraph) -> Vec<MenuItem> {
    let mut items = vec![MenuItem::Play, MenuItem::EditText];
    if selection.is_mergeable(graph) {
        items.push(MenuItem::Concat);
    }
    items
}
