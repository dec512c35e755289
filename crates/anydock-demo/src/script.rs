//! The scripted walkthrough: a document area beside a column of tool windows,
//! then an edge drop, a tab drop and a close replayed through [`DragMachine`].

use std::io::Write;

use anydock::{
    CloseOutcome, CloseRequest, ContentHandle, ContentId, DockConfig, DockLayout, DockNodeId,
    DockTree, DragDecision, DragMachine, DragPayload, DropOutcome, DropRegion, Orientation,
    PointerPosition, Rect,
};
use tracing::info;

use crate::error::{DemoError, Result};

/// Viewport the walkthrough solves layouts against.
pub const VIEWPORT: Rect = Rect::from_size(120, 40);

pub const SCENE: ContentId = ContentId::new(1);
pub const GAME: ContentId = ContentId::new(2);
pub const HIERARCHY: ContentId = ContentId::new(3);
pub const INSPECTOR: ContentId = ContentId::new(4);
pub const CONSOLE: ContentId = ContentId::new(5);

fn documents() -> DockLayout {
    DockLayout::tabs(vec![
        ContentHandle::new(SCENE.get(), "Scene").can_close(false),
        ContentHandle::new(GAME.get(), "Game"),
    ])
}

fn tool_windows() -> DockLayout {
    DockLayout::split(
        Orientation::Vertical,
        DockLayout::tabs(vec![
            ContentHandle::new(HIERARCHY.get(), "Hierarchy"),
            ContentHandle::new(INSPECTOR.get(), "Inspector"),
        ]),
        DockLayout::tabs(vec![ContentHandle::new(CONSOLE.get(), "Console")]),
    )
    .with_divider(0.6)
}

/// Build the starting workspace by splitting the empty root leaf.
pub fn build_workspace(config: DockConfig) -> Result<DockTree> {
    let mut tree = DockTree::with_config(config);
    let root = tree.root();
    tree.set_children(
        root,
        Some(documents()),
        Some(tool_windows()),
        Orientation::Horizontal,
    )?;
    let _ = tree.set_divider_ratio(root, 0.65)?;
    Ok(tree)
}

/// Run every step, writing a titled dump after each one.
pub fn run_script(config: DockConfig, out: &mut impl Write) -> Result<DockTree> {
    let mut tree = build_workspace(config)?;
    print_step(out, "initial layout", &tree)?;

    let outcome = drag_to_edge(&mut tree)?;
    info!(message = "demo.step", step = "edge drop", outcome = ?outcome);
    print_step(out, "console docked under the documents", &tree)?;

    let outcome = drag_to_tab(&mut tree)?;
    info!(message = "demo.step", step = "tab drop", outcome = ?outcome);
    print_step(out, "inspector tabbed before game", &tree)?;

    close_tool_windows(&mut tree, out)?;
    print_step(out, "hierarchy closed", &tree)?;

    tree.validate()?;
    Ok(tree)
}

fn print_step(out: &mut impl Write, title: &str, tree: &DockTree) -> Result<()> {
    writeln!(out, "== {title} ==")?;
    write!(out, "{tree}")?;
    writeln!(out)?;
    Ok(())
}

/// Handle and owning leaf of docked content.
fn docked(tree: &DockTree, content: ContentId) -> Result<(ContentHandle, DockNodeId)> {
    let leaf = tree
        .locate(content)
        .ok_or(anydock::DockError::UnknownContent { content })?;
    let handle = tree
        .leaf(leaf)?
        .items()
        .iter()
        .find(|item| item.id == content)
        .cloned()
        .ok_or(anydock::DockError::UnknownContent { content })?;
    Ok((handle, leaf))
}

/// Begin a drag of `content` over the leaf holding `anchor`, at `pick(bounds)`.
fn start_drag(
    tree: &DockTree,
    machine: &mut DragMachine,
    step: &'static str,
    content: ContentId,
    anchor: ContentId,
    pick: impl Fn(Rect) -> PointerPosition,
) -> Result<Option<DropRegion>> {
    let (handle, source) = docked(tree, content)?;
    let target = tree
        .locate(anchor)
        .ok_or(anydock::DockError::UnknownContent { content: anchor })?;
    let map = tree.solve_layout(VIEWPORT)?;
    let bounds = map
        .rect(target)
        .ok_or_else(|| DemoError::script(step, format!("no bounds for {target}")))?;
    let pointer = pick(bounds);
    match machine.enter(tree, DragPayload::docked(handle, source), target, bounds, pointer) {
        DragDecision::Accepted { region } => Ok(region),
        DragDecision::Rejected(reason) => Err(DemoError::Rejected { step, reason }),
    }
}

fn drag_to_edge(tree: &mut DockTree) -> Result<DropOutcome> {
    const STEP: &str = "edge drop";
    let mut machine = DragMachine::new();
    start_drag(tree, &mut machine, STEP, CONSOLE, SCENE, |bounds| {
        PointerPosition::new(
            i32::from(bounds.x + bounds.width / 2),
            i32::from(bounds.y + bounds.height / 2),
        )
    })?;
    // Slide from the centre down to the bottom row of the document area.
    let bounds = machine
        .session()
        .map(|session| session.bounds)
        .ok_or_else(|| DemoError::script(STEP, "drag ended early"))?;
    let region = machine.over(PointerPosition::new(
        i32::from(bounds.x + bounds.width / 2),
        i32::from(bounds.bottom().saturating_sub(1)),
    ));
    if region != Some(DropRegion::Down) {
        machine.cancel();
        return Err(DemoError::script(
            STEP,
            format!("pointer resolved to {region:?}, expected the bottom edge"),
        ));
    }
    Ok(machine.drop(tree)?)
}

fn drag_to_tab(tree: &mut DockTree) -> Result<DropOutcome> {
    const STEP: &str = "tab drop";
    let mut machine = DragMachine::new();
    start_drag(tree, &mut machine, STEP, INSPECTOR, GAME, |bounds| {
        PointerPosition::new(i32::from(bounds.x + 2), i32::from(bounds.y))
    })?;
    Ok(machine.drop_on_tab(tree, GAME)?)
}

fn close_tool_windows(tree: &mut DockTree, out: &mut impl Write) -> Result<()> {
    let mut policy = |request: &CloseRequest<'_>| {
        info!(
            message = "demo.close",
            content = request.content.id.get(),
            leaf = request.leaf.get()
        );
        true
    };
    for content in [SCENE, HIERARCHY] {
        let outcome = tree.close_item(content, &mut policy)?;
        let summary = match &outcome {
            CloseOutcome::Closed(handle) => format!("closed {}", handle.label),
            CloseOutcome::Vetoed => "close vetoed".to_string(),
            CloseOutcome::NotClosable => "not closable".to_string(),
        };
        writeln!(out, "close {content}: {summary}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(tree: &DockTree, content: ContentId) -> Vec<String> {
        let leaf = tree.locate(content).expect("docked");
        tree.leaf(leaf)
            .expect("leaf")
            .items()
            .iter()
            .map(|item| item.label.clone())
            .collect()
    }

    #[test]
    fn workspace_starts_with_three_leaves() {
        let tree = build_workspace(DockConfig::default()).expect("workspace");
        assert_eq!(tree.leaf_ids().len(), 3);
        assert_eq!(tree.item_count(), 5);
        assert_eq!(labels(&tree, HIERARCHY), ["Hierarchy", "Inspector"]);
        tree.validate().expect("valid");
    }

    #[test]
    fn script_ends_with_documents_over_console() {
        let mut out = Vec::new();
        let tree = run_script(DockConfig::default(), &mut out).expect("script runs");

        let root = tree.split(tree.root()).expect("root stays a split");
        assert_eq!(root.orientation, Orientation::Vertical);
        assert_eq!(labels(&tree, SCENE), ["Scene", "Inspector", "Game"]);
        assert_eq!(labels(&tree, CONSOLE), ["Console"]);
        assert_eq!(tree.locate(HIERARCHY), None);
        assert_eq!(tree.item_count(), 4);

        let text = String::from_utf8(out).expect("utf8");
        assert_eq!(text.matches("== ").count(), 4);
        assert!(text.contains("close content:1: not closable"));
        assert!(text.contains("close content:3: closed Hierarchy"));
    }

    #[test]
    fn narrow_edge_band_still_reaches_the_bottom_edge() {
        let config = DockConfig::default().with_edge_band(0.05);
        let mut sink = Vec::new();
        run_script(config, &mut sink).expect("script runs");
    }
}
