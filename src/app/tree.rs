use crate::model::{Category, NodeKind, ResourceItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct NodeId(u64);

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) id: NodeId,
    pub(crate) name: String,
    pub(crate) kind: NodeKind,
    pub(crate) connection_id: String,
    pub(crate) workspace: String,
    pub(crate) children: Vec<Node>,
    pub(crate) loaded: bool,
    pub(crate) loading: bool,
    pub(crate) expanded: bool,
    pub(crate) error: Option<String>,
    pub(crate) enabled: Option<bool>,
}

impl Node {
    pub(crate) fn expandable(&self) -> bool {
        !matches!(self.kind, NodeKind::Resource(_))
    }
}

/// Everything a child fetch needs, captured when the fetch is issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FetchRequest {
    pub(crate) node: NodeId,
    pub(crate) generation: u64,
    pub(crate) connection_id: String,
    pub(crate) workspace: String,
    pub(crate) kind: NodeKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct TreeSnapshot {
    pub(crate) selected: Option<Vec<String>>,
    pub(crate) expanded: Vec<Vec<String>>,
}

#[derive(Debug, Clone)]
pub(crate) struct TreeRow {
    pub(crate) id: NodeId,
    pub(crate) depth: usize,
    pub(crate) name: String,
    pub(crate) kind: NodeKind,
    pub(crate) expandable: bool,
    pub(crate) expanded: bool,
    pub(crate) loading: bool,
    pub(crate) error: Option<String>,
    pub(crate) enabled: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SearchHit {
    pub(crate) path: Vec<String>,
    pub(crate) label: String,
}

/// Lazily populated connection / workspace / category / resource hierarchy.
#[derive(Debug, Default)]
pub(crate) struct ResourceTree {
    roots: Vec<Node>,
    next_id: u64,
    generation: u64,
    selected: Option<NodeId>,
    pending_restore: Option<TreeSnapshot>,
}

/// How far a snapshot path resolves in the current tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PathState {
    Found(NodeId),
    Waiting,
    Gone,
}

impl ResourceTree {
    /// Discards every loaded node and recreates one root per connection.
    pub(crate) fn rebuild(&mut self, connections: &[(String, String)]) {
        self.generation += 1;
        self.pending_restore = None;
        self.roots = connections
            .iter()
            .map(|(id, label)| self.new_node(label.clone(), NodeKind::Connection, id, ""))
            .collect();
        self.selected = self.roots.first().map(|root| root.id);
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn roots(&self) -> &[Node] {
        &self.roots
    }

    fn new_node(
        &mut self,
        name: String,
        kind: NodeKind,
        connection_id: &str,
        workspace: &str,
    ) -> Node {
        self.next_id += 1;
        Node {
            id: NodeId(self.next_id),
            name,
            kind,
            connection_id: connection_id.to_string(),
            workspace: workspace.to_string(),
            children: vec![],
            loaded: matches!(kind, NodeKind::Resource(_)),
            loading: false,
            expanded: false,
            error: None,
            enabled: None,
        }
    }

    fn workspace_node(&mut self, connection_id: &str, name: &str) -> Node {
        let mut node = self.new_node(name.to_string(), NodeKind::Workspace, connection_id, name);
        node.children = Category::ALL
            .iter()
            .map(|category| {
                self.new_node(
                    category.label().to_string(),
                    NodeKind::Category(*category),
                    connection_id,
                    name,
                )
            })
            .collect();
        node.loaded = true;
        node
    }

    pub(crate) fn find(&self, id: NodeId) -> Option<&Node> {
        fn walk(nodes: &[Node], id: NodeId) -> Option<&Node> {
            for node in nodes {
                if node.id == id {
                    return Some(node);
                }
                if let Some(found) = walk(&node.children, id) {
                    return Some(found);
                }
            }
            None
        }
        walk(&self.roots, id)
    }

    fn find_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        fn walk(nodes: &mut [Node], id: NodeId) -> Option<&mut Node> {
            for node in nodes {
                if node.id == id {
                    return Some(node);
                }
                if let Some(found) = walk(&mut node.children, id) {
                    return Some(found);
                }
            }
            None
        }
        walk(&mut self.roots, id)
    }

    /// Names from the root down to `id`.
    pub(crate) fn path_to(&self, id: NodeId) -> Option<Vec<String>> {
        fn walk(nodes: &[Node], id: NodeId, path: &mut Vec<String>) -> bool {
            for node in nodes {
                path.push(node.name.clone());
                if node.id == id || walk(&node.children, id, path) {
                    return true;
                }
                path.pop();
            }
            false
        }
        let mut path = Vec::new();
        walk(&self.roots, id, &mut path).then_some(path)
    }

    /// Ids of the nodes matching each leading element of `path`.
    fn resolve_prefix(&self, path: &[String]) -> Vec<NodeId> {
        let mut ids = Vec::new();
        let mut level = self.roots.as_slice();
        for name in path {
            let Some(node) = level.iter().find(|node| &node.name == name) else {
                break;
            };
            ids.push(node.id);
            level = &node.children;
        }
        ids
    }

    pub(crate) fn find_path(&self, path: &[String]) -> Option<NodeId> {
        let ids = self.resolve_prefix(path);
        if ids.len() == path.len() {
            ids.last().copied()
        } else {
            None
        }
    }

    /// Marks the node expanded and returns a fetch when its children are not
    /// loaded and no fetch is already in flight.
    pub(crate) fn expand(&mut self, id: NodeId) -> Option<FetchRequest> {
        let generation = self.generation;
        let node = self.find_mut(id)?;
        if !node.expandable() {
            return None;
        }
        node.expanded = true;
        if node.loaded || node.loading {
            return None;
        }
        node.loading = true;
        node.error = None;
        Some(FetchRequest {
            node: node.id,
            generation,
            connection_id: node.connection_id.clone(),
            workspace: node.workspace.clone(),
            kind: node.kind,
        })
    }

    pub(crate) fn collapse(&mut self, id: NodeId) {
        if let Some(node) = self.find_mut(id) {
            node.expanded = false;
        }
        self.settle_selection();
    }

    /// Folds a fetch result into the tree. Results for an earlier tree
    /// generation, a vanished node or a node that is not loading are dropped.
    /// Returns follow-up fetches issued while restoring a snapshot.
    pub(crate) fn apply_children(
        &mut self,
        request: &FetchRequest,
        result: Result<Vec<ResourceItem>, String>,
    ) -> Vec<FetchRequest> {
        if request.generation != self.generation {
            return vec![];
        }
        let Some(node) = self.find(request.node) else {
            return vec![];
        };
        if !node.loading {
            return vec![];
        }
        let kind = node.kind;
        let connection_id = node.connection_id.clone();
        let workspace = node.workspace.clone();
        match result {
            Ok(items) => {
                let children = items
                    .into_iter()
                    .map(|item| match kind {
                        NodeKind::Connection => self.workspace_node(&connection_id, &item.name),
                        NodeKind::Category(category) => {
                            let mut child = self.new_node(
                                item.name,
                                NodeKind::Resource(category),
                                &connection_id,
                                &workspace,
                            );
                            child.enabled = item.enabled;
                            child
                        }
                        _ => self.new_node(item.name, kind, &connection_id, &workspace),
                    })
                    .collect();
                if let Some(node) = self.find_mut(request.node) {
                    node.children = children;
                    node.loaded = true;
                    node.loading = false;
                    node.error = None;
                }
            }
            Err(err) => {
                if let Some(node) = self.find_mut(request.node) {
                    node.loading = false;
                    node.loaded = false;
                    node.error = Some(err);
                }
            }
        }
        self.settle_selection();
        self.continue_restore()
    }

    pub(crate) fn rows(&self) -> Vec<TreeRow> {
        fn flatten(node: &Node, depth: usize, rows: &mut Vec<TreeRow>) {
            rows.push(TreeRow {
                id: node.id,
                depth,
                name: node.name.clone(),
                kind: node.kind,
                expandable: node.expandable(),
                expanded: node.expanded,
                loading: node.loading,
                error: node.error.clone(),
                enabled: node.enabled,
            });
            if node.expanded {
                for child in &node.children {
                    flatten(child, depth + 1, rows);
                }
            }
        }
        let mut rows = Vec::new();
        for root in &self.roots {
            flatten(root, 0, &mut rows);
        }
        rows
    }

    /// Row index of the selected node.
    pub(crate) fn cursor(&self) -> usize {
        let rows = self.rows();
        self.selected
            .and_then(|id| rows.iter().position(|row| row.id == id))
            .unwrap_or(0)
    }

    pub(crate) fn selected_id(&self) -> Option<NodeId> {
        self.selected
    }

    pub(crate) fn selected(&self) -> Option<&Node> {
        self.selected.and_then(|id| self.find(id))
    }

    pub(crate) fn move_cursor(&mut self, delta: isize) {
        self.keep_user_selection();
        let rows = self.rows();
        if rows.is_empty() {
            self.selected = None;
            return;
        }
        let next = (self.cursor() as isize + delta).clamp(0, rows.len() as isize - 1) as usize;
        self.selected = Some(rows[next].id);
    }

    /// Moves a selection hidden by a collapse onto its nearest visible
    /// ancestor, or onto the first row when the node is gone.
    fn settle_selection(&mut self) {
        let rows = self.rows();
        let visible = |id: &NodeId| rows.iter().any(|row| row.id == *id);
        if self.selected.as_ref().is_some_and(visible) {
            return;
        }
        let lineage = self
            .selected
            .and_then(|id| self.path_to(id))
            .map(|path| self.resolve_prefix(&path))
            .unwrap_or_default();
        self.selected = lineage
            .into_iter()
            .rev()
            .find(visible)
            .or_else(|| rows.first().map(|row| row.id));
    }

    /// Expands every ancestor of `id` and selects it.
    fn select(&mut self, id: NodeId) -> bool {
        let Some(path) = self.path_to(id) else {
            return false;
        };
        let ancestors = self.resolve_prefix(&path[..path.len().saturating_sub(1)]);
        for ancestor in ancestors {
            if let Some(node) = self.find_mut(ancestor) {
                node.expanded = true;
            }
        }
        self.selected = Some(id);
        true
    }

    pub(crate) fn reveal(&mut self, path: &[String]) -> bool {
        self.keep_user_selection();
        match self.find_path(path) {
            Some(id) => self.select(id),
            None => false,
        }
    }

    pub(crate) fn snapshot(&self) -> TreeSnapshot {
        fn collect(nodes: &[Node], prefix: &mut Vec<String>, out: &mut Vec<Vec<String>>) {
            for node in nodes {
                prefix.push(node.name.clone());
                if node.expanded {
                    out.push(prefix.clone());
                    collect(&node.children, prefix, out);
                }
                prefix.pop();
            }
        }
        let mut expanded = Vec::new();
        collect(&self.roots, &mut Vec::new(), &mut expanded);
        TreeSnapshot {
            selected: self.selected_id().and_then(|id| self.path_to(id)),
            expanded,
        }
    }

    /// Starts restoring `snapshot` on a freshly rebuilt tree. Paths are
    /// expanded as their parents finish loading; the returned fetches are the
    /// ones that can be issued right away.
    pub(crate) fn restore(&mut self, snapshot: TreeSnapshot) -> Vec<FetchRequest> {
        self.pending_restore = Some(snapshot);
        self.continue_restore()
    }

    pub(crate) fn restoring(&self) -> bool {
        self.pending_restore.is_some()
    }

    /// A selection made by the user wins over the one being restored.
    /// Expanded paths still come back as their parents load.
    fn keep_user_selection(&mut self) {
        if let Some(pending) = self.pending_restore.as_mut() {
            pending.selected = None;
        }
        if self
            .pending_restore
            .as_ref()
            .is_some_and(|pending| pending.expanded.is_empty())
        {
            self.pending_restore = None;
        }
    }

    /// Expands the resolvable part of `path`. A node whose fetch failed is
    /// not retried here, so the path counts as gone below it.
    fn open_path(&mut self, path: &[String], requests: &mut Vec<FetchRequest>) -> PathState {
        let ids = self.resolve_prefix(path);
        for id in &ids {
            if self.find(*id).is_some_and(|node| node.error.is_some()) {
                return PathState::Gone;
            }
            requests.extend(self.expand(*id));
        }
        self.path_state(path, &ids)
    }

    fn path_state(&self, path: &[String], ids: &[NodeId]) -> PathState {
        match ids.last() {
            Some(id) if ids.len() == path.len() => PathState::Found(*id),
            Some(id) if self.find(*id).is_some_and(|node| node.loading) => PathState::Waiting,
            _ => PathState::Gone,
        }
    }

    /// Re-applies the pending snapshot. The snapshot is kept until every
    /// expanded path is open or can no longer resolve, and until the
    /// selected path is placed or known to be gone.
    fn continue_restore(&mut self) -> Vec<FetchRequest> {
        let Some(mut pending) = self.pending_restore.take() else {
            return vec![];
        };
        let mut requests = Vec::new();
        let mut waiting = false;
        for path in &pending.expanded {
            waiting |= self.open_path(path, &mut requests) == PathState::Waiting;
        }
        if let Some(path) = pending.selected.take() {
            let ids = self.resolve_prefix(&path);
            match self.path_state(&path, &ids) {
                PathState::Found(id) => {
                    self.select(id);
                }
                PathState::Waiting => {
                    pending.selected = Some(path);
                    waiting = true;
                }
                PathState::Gone => self.selected = self.roots.first().map(|root| root.id),
            }
        }
        if waiting {
            self.pending_restore = Some(pending);
        }
        requests
    }

    /// Case-insensitive substring search over every loaded node.
    pub(crate) fn search(&self, query: &str) -> Vec<SearchHit> {
        fn walk(
            nodes: &[Node],
            needle: &str,
            prefix: &mut Vec<String>,
            hits: &mut Vec<SearchHit>,
        ) {
            for node in nodes {
                prefix.push(node.name.clone());
                if matches!(node.kind, NodeKind::Workspace | NodeKind::Resource(_))
                    && node.name.to_lowercase().contains(needle)
                {
                    hits.push(SearchHit {
                        path: prefix.clone(),
                        label: prefix.join(" / "),
                    });
                }
                walk(&node.children, needle, prefix, hits);
                prefix.pop();
            }
        }
        let needle = query.trim().to_lowercase();
        let mut hits = Vec::new();
        if needle.is_empty() {
            return hits;
        }
        walk(&self.roots, &needle, &mut Vec::new(), &mut hits);
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(names: &[&str]) -> Vec<ResourceItem> {
        names.iter().map(|name| ResourceItem::named(*name)).collect()
    }

    fn path(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|part| part.to_string()).collect()
    }

    fn tree_with(connections: &[&str]) -> ResourceTree {
        let mut tree = ResourceTree::default();
        let entries: Vec<_> = connections
            .iter()
            .map(|name| (format!("id-{name}"), name.to_string()))
            .collect();
        tree.rebuild(&entries);
        tree
    }

    fn load(tree: &mut ResourceTree, at: &[&str], names: &[&str]) -> Vec<FetchRequest> {
        let id = tree.find_path(&path(at)).unwrap();
        let request = tree.expand(id).unwrap();
        tree.apply_children(&request, Ok(items(names)))
    }

    #[test]
    fn expand_is_idempotent_once_loaded() {
        let mut tree = tree_with(&["gs"]);
        load(&mut tree, &["gs"], &["demo", "topp"]);
        let root = tree.find_path(&path(&["gs"])).unwrap();
        assert!(tree.expand(root).is_none());
        assert!(tree.expand(root).is_none());
        assert_eq!(tree.find(root).unwrap().children.len(), 2);
    }

    #[test]
    fn expand_while_loading_issues_no_second_fetch() {
        let mut tree = tree_with(&["gs"]);
        let root = tree.find_path(&path(&["gs"])).unwrap();
        let first = tree.expand(root);
        assert!(first.is_some());
        assert!(tree.expand(root).is_none());
    }

    #[test]
    fn workspace_nodes_carry_category_children() {
        let mut tree = tree_with(&["gs"]);
        load(&mut tree, &["gs"], &["demo"]);
        let ws = tree.find_path(&path(&["gs", "demo"])).unwrap();
        assert!(tree.expand(ws).is_none());
        let node = tree.find(ws).unwrap();
        assert_eq!(node.children.len(), Category::ALL.len());
        assert!(node.children.iter().all(|child| !child.loaded));

        let request = tree
            .expand(tree.find_path(&path(&["gs", "demo", "Layers"])).unwrap())
            .unwrap();
        assert_eq!(request.workspace, "demo");
        assert_eq!(request.connection_id, "id-gs");
        assert_eq!(request.kind, NodeKind::Category(Category::Layers));
    }

    #[test]
    fn children_keep_server_order() {
        let mut tree = tree_with(&["gs"]);
        load(&mut tree, &["gs"], &["zeta", "alpha", "mid"]);
        let names: Vec<_> = tree.roots()[0]
            .children
            .iter()
            .map(|node| node.name.as_str())
            .collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn failed_load_records_error_and_allows_retry() {
        let mut tree = tree_with(&["a", "b"]);
        let a = tree.find_path(&path(&["a"])).unwrap();
        let b = tree.find_path(&path(&["b"])).unwrap();
        let req_a = tree.expand(a).unwrap();
        let req_b = tree.expand(b).unwrap();
        tree.apply_children(&req_a, Err("connection refused".to_string()));
        tree.apply_children(&req_b, Ok(items(&["demo"])));

        let node_a = tree.find(a).unwrap();
        assert_eq!(node_a.error.as_deref(), Some("connection refused"));
        assert!(!node_a.loaded && !node_a.loading);
        assert!(tree.find(b).unwrap().loaded);
        assert!(tree.expand(a).is_some());
        assert!(tree.find(a).unwrap().error.is_none());
    }

    #[test]
    fn results_for_previous_generation_are_ignored() {
        let mut tree = tree_with(&["gs"]);
        let root = tree.find_path(&path(&["gs"])).unwrap();
        let stale = tree.expand(root).unwrap();
        tree.rebuild(&[("id-gs".to_string(), "gs".to_string())]);
        tree.apply_children(&stale, Ok(items(&["demo"])));
        assert!(tree.roots()[0].children.is_empty());
        assert!(!tree.roots()[0].loading);
    }

    #[test]
    fn rows_follow_expansion() {
        let mut tree = tree_with(&["gs"]);
        load(&mut tree, &["gs"], &["demo"]);
        assert_eq!(tree.rows().len(), 2);
        tree.expand(tree.find_path(&path(&["gs", "demo"])).unwrap());
        assert_eq!(tree.rows().len(), 2 + Category::ALL.len());
        tree.collapse(tree.find_path(&path(&["gs"])).unwrap());
        assert_eq!(tree.rows().len(), 1);
    }

    #[test]
    fn restore_reopens_selected_path_after_rebuild() {
        let mut tree = tree_with(&["gs"]);
        load(&mut tree, &["gs"], &["demo"]);
        tree.expand(tree.find_path(&path(&["gs", "demo"])).unwrap());
        load(&mut tree, &["gs", "demo", "Layers"], &["roads", "rivers"]);
        assert!(tree.reveal(&path(&["gs", "demo", "Layers", "rivers"])));
        let snapshot = tree.snapshot();
        assert_eq!(
            snapshot.selected,
            Some(path(&["gs", "demo", "Layers", "rivers"]))
        );

        tree.rebuild(&[("id-gs".to_string(), "gs".to_string())]);
        let requests = tree.restore(snapshot);
        assert_eq!(requests.len(), 1);
        assert!(tree.restoring());

        let follow = tree.apply_children(&requests[0], Ok(items(&["demo"])));
        assert_eq!(follow.len(), 1);
        assert_eq!(follow[0].kind, NodeKind::Category(Category::Layers));

        let done = tree.apply_children(&follow[0], Ok(items(&["roads", "rivers"])));
        assert!(done.is_empty());
        assert!(!tree.restoring());
        let selected = tree.selected().unwrap();
        assert_eq!(selected.name, "rivers");
    }

    #[test]
    fn restore_falls_back_to_root_when_path_is_gone() {
        let mut tree = tree_with(&["gs"]);
        load(&mut tree, &["gs"], &["demo", "old"]);
        assert!(tree.reveal(&path(&["gs", "old"])));
        let snapshot = tree.snapshot();

        tree.rebuild(&[("id-gs".to_string(), "gs".to_string())]);
        let requests = tree.restore(snapshot);
        tree.apply_children(&requests[0], Ok(items(&["demo"])));
        assert!(!tree.restoring());
        assert_eq!(tree.cursor(), 0);
        assert_eq!(tree.selected().unwrap().name, "gs");
    }

    #[test]
    fn cursor_movement_overrides_restored_selection_only() {
        let mut tree = tree_with(&["gs", "other"]);
        load(&mut tree, &["gs"], &["demo"]);
        tree.expand(tree.find_path(&path(&["gs", "demo"])).unwrap());
        assert!(tree.reveal(&path(&["gs", "demo", "Layers"])));
        let snapshot = tree.snapshot();
        tree.rebuild(&[
            ("id-gs".to_string(), "gs".to_string()),
            ("id-other".to_string(), "other".to_string()),
        ]);
        let requests = tree.restore(snapshot);
        tree.move_cursor(1);
        assert_eq!(tree.selected().unwrap().name, "other");
        assert!(tree.restoring());

        tree.apply_children(&requests[0], Ok(items(&["demo"])));
        let demo = tree.find_path(&path(&["gs", "demo"])).unwrap();
        assert!(tree.find(demo).unwrap().expanded);
        assert!(!tree.restoring());
        assert_eq!(tree.selected().unwrap().name, "other");
        assert_eq!(tree.rows().len(), 3 + Category::ALL.len());
    }

    #[test]
    fn selection_stays_on_node_when_rows_load_above_it() {
        let mut tree = tree_with(&["gs1", "gs2"]);
        let gs1 = tree.find_path(&path(&["gs1"])).unwrap();
        let request = tree.expand(gs1).unwrap();
        tree.move_cursor(1);
        assert_eq!(tree.selected().unwrap().name, "gs2");

        tree.apply_children(&request, Ok(items(&["ws_a", "ws_b"])));
        assert_eq!(tree.selected().unwrap().name, "gs2");
        assert_eq!(tree.cursor(), 3);

        tree.move_cursor(-1);
        assert_eq!(tree.selected().unwrap().name, "ws_b");
    }

    #[test]
    fn collapse_moves_hidden_selection_to_visible_ancestor() {
        let mut tree = tree_with(&["gs", "other"]);
        load(&mut tree, &["gs"], &["demo"]);
        tree.expand(tree.find_path(&path(&["gs", "demo"])).unwrap());
        assert!(tree.reveal(&path(&["gs", "demo", "Styles"])));

        tree.collapse(tree.find_path(&path(&["gs"])).unwrap());
        assert_eq!(tree.selected().unwrap().name, "gs");
        assert_eq!(tree.cursor(), 0);
    }

    #[test]
    fn restore_reopens_expanded_paths_below_a_shallow_selection() {
        let mut tree = tree_with(&["gs"]);
        load(&mut tree, &["gs"], &["demo"]);
        tree.expand(tree.find_path(&path(&["gs", "demo"])).unwrap());
        load(&mut tree, &["gs", "demo", "Layers"], &["roads"]);
        assert!(tree.reveal(&path(&["gs"])));
        let snapshot = tree.snapshot();
        assert_eq!(snapshot.expanded.len(), 3);

        tree.rebuild(&[("id-gs".to_string(), "gs".to_string())]);
        let requests = tree.restore(snapshot);
        assert_eq!(requests.len(), 1);
        assert!(tree.restoring());
        assert_eq!(tree.selected().unwrap().name, "gs");

        let follow = tree.apply_children(&requests[0], Ok(items(&["demo"])));
        assert_eq!(follow.len(), 1);
        let demo = tree.find_path(&path(&["gs", "demo"])).unwrap();
        assert!(tree.find(demo).unwrap().expanded);

        tree.apply_children(&follow[0], Ok(items(&["roads"])));
        assert!(!tree.restoring());
        assert!(tree.find_path(&path(&["gs", "demo", "Layers", "roads"])).is_some());
        assert_eq!(tree.selected().unwrap().name, "gs");
    }

    #[test]
    fn restore_gives_up_on_paths_below_a_failed_load() {
        let mut tree = tree_with(&["gs"]);
        load(&mut tree, &["gs"], &["demo"]);
        tree.expand(tree.find_path(&path(&["gs", "demo"])).unwrap());
        load(&mut tree, &["gs", "demo", "Styles"], &["line"]);
        assert!(tree.reveal(&path(&["gs", "demo", "Styles", "line"])));
        let snapshot = tree.snapshot();

        tree.rebuild(&[("id-gs".to_string(), "gs".to_string())]);
        let requests = tree.restore(snapshot);
        let follow = tree.apply_children(&requests[0], Ok(items(&["demo"])));
        assert_eq!(follow.len(), 1);
        let retry = tree.apply_children(&follow[0], Err("HTTP 500".to_string()));
        assert!(retry.is_empty());
        assert!(!tree.restoring());
        assert_eq!(tree.selected().unwrap().name, "gs");
    }

    #[test]
    fn search_matches_loaded_resources() {
        let mut tree = tree_with(&["gs"]);
        load(&mut tree, &["gs"], &["demo"]);
        load(&mut tree, &["gs", "demo", "Styles"], &["Roads_Line", "water"]);
        let hits = tree.search("roads");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].label, "gs / demo / Styles / Roads_Line");
        assert!(tree.search("  ").is_empty());

        tree.collapse(tree.find_path(&path(&["gs"])).unwrap());
        assert!(tree.reveal(&hits[0].path));
        assert_eq!(tree.selected().unwrap().name, "Roads_Line");
    }
}
