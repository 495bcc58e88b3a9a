//! Retention directory naming for soft deletes.

use crate::tree::path::{self, RECYCLE_DIR};

/// Destination inside the retention directory for `item`.
///
/// Folders become `Recycle/<name>_<millis>`, files `Recycle/<stem>_<millis><ext>`
/// so the extension (and Markdown-ness) survives the move.
pub fn recycle_target(item: &str, is_folder: bool, millis: i64) -> String {
    let name = path::file_name(item);
    let renamed = if is_folder {
        format!("{}_{}", name, millis)
    } else {
        let (stem, ext) = path::split_extension(name);
        format!("{}_{}{}", stem, millis, ext)
    };
    path::join(RECYCLE_DIR, &renamed)
}
