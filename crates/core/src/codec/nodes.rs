use crate::{
    model::{Branch, Node, Router},
    PathMusicError, Result,
};

use super::{
    literal::{parse_list, Element, Literal, RecordFields},
    source_line,
};

/// Nodes and routers read from a nodes file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeDocument {
    pub nodes: Vec<Node>,
    pub routers: Vec<Router>,
}

/// Parses the nodes file. Branch records attach to the node record before
/// them; bare integer arrays are routers and close the node section.
pub fn parse_nodes_and_routers(source: &str) -> Result<NodeDocument> {
    let mut document = NodeDocument::default();
    let mut declared_branches = Vec::new();

    for Element { line, value } in parse_list(source)? {
        match value {
            Literal::Array(items) => {
                document.routers.push(parse_router(source, line, items)?);
            }
            Literal::Record(fields) => {
                if !document.routers.is_empty() {
                    return Err(fields_error(
                        source,
                        line,
                        "node and branch records must precede the router lists",
                    ));
                }
                let mut fields = RecordFields::from_fields(source, line, fields);
                if fields.has("index") {
                    let id = document.nodes.len();
                    let (node, declared) = parse_node(id, &mut fields)?;
                    fields.finish()?;
                    declared_branches.push((line, declared));
                    document.nodes.push(node);
                } else if fields.has("controlmin") {
                    let branch = Branch {
                        control_min: fields.int("controlmin")?,
                        control_max: fields.int("controlmax")?,
                        dst_node: fields.int("dstnode")?,
                    };
                    fields.finish()?;
                    let owner = document.nodes.last_mut().ok_or_else(|| {
                        fields_error(source, line, "branch record before any node")
                    })?;
                    owner.branches.push(branch);
                } else {
                    return Err(fields.error("unknown record, expected a node or a branch"));
                }
            }
            other => {
                return Err(fields_error(
                    source,
                    line,
                    &format!("unexpected {} in node list", other.describe()),
                ));
            }
        }
    }

    for (node, (line, declared)) in document.nodes.iter().zip(declared_branches) {
        if declared != node.branches.len() as i64 {
            tracing::warn!(
                node = node.id,
                line,
                declared,
                actual = node.branches.len(),
                "numbranches disagrees with the branch records that follow"
            );
        }
    }

    tracing::debug!(
        nodes = document.nodes.len(),
        routers = document.routers.len(),
        "parsed nodes"
    );
    Ok(document)
}

fn parse_node(id: usize, fields: &mut RecordFields<'_>) -> Result<(Node, i64)> {
    let music_index = fields.int("index")?;
    let track_id = fields.int("trackID")?;
    let section_id = fields.int("sectionID")?;
    let repeat = fields.int("repeat")?;
    let router_id = fields.int("routerID")?;
    let declared = fields.int("numbranches")?;
    let node = Node {
        id,
        music_index,
        track_id,
        section_id,
        repeat,
        router_id,
        beats: fields.int("beats")?,
        bars: fields.int("bars")?,
        part_id: fields.int("partID")?,
        notes: fields.int("notes")?,
        branches: Vec::new(),
    };
    Ok((node, declared))
}

fn parse_router(source: &str, line: usize, items: Vec<Literal>) -> Result<Router> {
    items
        .into_iter()
        .map(|item| match item {
            Literal::Number(value) => Ok(value),
            other => Err(fields_error(
                source,
                line,
                &format!("router entries must be node ids, found {}", other.describe()),
            )),
        })
        .collect()
}

fn fields_error(source: &str, line: usize, message: &str) -> PathMusicError {
    PathMusicError::parse(line, source_line(source, line), message)
}

pub fn dump_nodes_and_routers(nodes: &[Node], routers: &[Router]) -> String {
    let mut out = String::from("[\n");
    for (i, node) in nodes.iter().enumerate() {
        out.push_str(&format!(
            "{{index: {}, trackID: {}, sectionID: {}, repeat: {}, routerID: {}, numbranches: {}, beats: {}, bars: {}, partID: {}, notes: {}}}, //{i}\n",
            node.music_index,
            node.track_id,
            node.section_id,
            node.repeat,
            node.router_id,
            node.branches.len(),
            node.beats,
            node.bars,
            node.part_id,
            node.notes,
        ));
        for branch in &node.branches {
            out.push_str(&format!(
                "\t{{controlmin: {}, controlmax: {}, dstnode: {}}},\n",
                branch.control_min, branch.control_max, branch.dst_node
            ));
        }
    }
    for (i, router) in routers.iter().enumerate() {
        let entries: Vec<String> = router.iter().map(i64::to_string).collect();
        out.push_str(&format!("[{}], //{i}\n", entries.join(",")));
    }
    out.push_str("]\n");
    out
}
