//! Text rendering for CLI output.

use crate::cache::EditCacheEntry;
use crate::remote::{Attachment, SearchHit, VersionRecord};
use crate::tree::node::{DirectoryNavNode, FileRef, TreeNode};
use chrono::{DateTime, Local, Utc};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

fn local_time(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(header);
    table
}

/// Indented full tree; directories end with `/`.
pub fn format_tree_text(nodes: &[TreeNode]) -> String {
    fn walk(nodes: &[TreeNode], depth: usize, out: &mut String) {
        for node in nodes {
            let indent = "  ".repeat(depth);
            if node.is_directory() {
                out.push_str(&format!("{}{}/\n", indent, node.name.blue().bold()));
                walk(node.children(), depth + 1, out);
            } else {
                out.push_str(&format!("{}{}\n", indent, node.name));
            }
        }
    }
    let mut out = String::new();
    walk(nodes, 0, &mut out);
    if out.is_empty() {
        out.push_str("(empty)\n");
    }
    out
}

/// Directory navigation tree with recursive Markdown counts.
pub fn format_nav_text(nodes: &[DirectoryNavNode], total: usize) -> String {
    fn walk(nodes: &[DirectoryNavNode], depth: usize, out: &mut String) {
        for node in nodes {
            out.push_str(&format!(
                "{}{} ({})\n",
                "  ".repeat(depth),
                node.name.blue().bold(),
                node.markdown_file_count
            ));
            walk(&node.children, depth + 1, out);
        }
    }
    let mut out = format!("{}\n\n", format_section_heading("Folders"));
    walk(nodes, 0, &mut out);
    out.push_str(&format!("\n{} Markdown files in total\n", total));
    out
}

pub fn format_file_list_text(folder: &str, files: &[FileRef]) -> String {
    let title = if folder.is_empty() { "/" } else { folder };
    let mut out = format!("{}\n\n", format_section_heading(title));
    if files.is_empty() {
        out.push_str("No Markdown files.\n");
        return out;
    }
    for file in files {
        out.push_str(&format!("  {}\n", file.name));
    }
    out
}

pub fn format_history_text(path: &str, history: &[VersionRecord]) -> String {
    let mut out = format!("{}\n\n", format_section_heading(&format!("History of {}", path)));
    if history.is_empty() {
        out.push_str("No versions recorded.\n");
        return out;
    }
    let mut table = table(vec!["Id", "When", "Type", "Comment"]);
    for record in history {
        table.add_row(vec![
            record.id.to_string(),
            local_time(record.timestamp),
            record.kind.clone(),
            record.comment.clone(),
        ]);
    }
    out.push_str(&format!("{}\n", table));
    out
}

pub fn format_search_text(query: &str, hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return format!("No matches for \"{}\".\n", query);
    }
    let mut out = String::new();
    for hit in hits {
        out.push_str(&format!("{}\n", hit.path.green().bold()));
        for line in &hit.context {
            out.push_str(&format!("    {}\n", line.trim_end()));
        }
    }
    out
}

pub fn format_attachments_text(path: &str, attachments: &[Attachment]) -> String {
    let mut out = format!(
        "{}\n\n",
        format_section_heading(&format!("Attachments of {}", path))
    );
    if attachments.is_empty() {
        out.push_str("No attachments.\n");
        return out;
    }
    let mut table = table(vec!["Name", "Path", "Size", "Modified"]);
    for attachment in attachments {
        table.add_row(vec![
            attachment.name.clone(),
            attachment.attach_path.clone(),
            attachment.size.to_string(),
            attachment
                .mod_time
                .map(local_time)
                .unwrap_or_else(|| "-".to_string()),
        ]);
    }
    out.push_str(&format!("{}\n", table));
    out
}

pub fn format_pending_edits_text(entries: &[EditCacheEntry]) -> String {
    let mut out = format!("{}\n\n", format_section_heading("Pending edits"));
    if entries.is_empty() {
        out.push_str("No cached edits. Everything reached the server.\n");
        return out;
    }
    let mut table = table(vec!["Path", "Cached at", "Bytes"]);
    for entry in entries {
        table.add_row(vec![
            entry.path.clone(),
            local_time(entry.timestamp),
            entry.content.len().to_string(),
        ]);
    }
    out.push_str(&format!("{}\n", table));
    out
}
