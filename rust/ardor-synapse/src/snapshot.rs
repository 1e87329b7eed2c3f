//! Point-in-time descriptions of a single element.

use serde::{Deserialize, Serialize};

use crate::{
    Dom,
    config::{SOURCE_FILE_ATTRIBUTE, SOURCE_LINE_ATTRIBUTE},
};

/// Maximum length of the `innerText` carried in a snapshot, in UTF-16 code
/// units.
pub const INNER_TEXT_LIMIT: usize = 50;

/// The longest prefix of `text` spanning at most `limit` UTF-16 code units.
/// A character whose surrogate pair would straddle the limit is left out.
fn truncate_utf16(text: &str, limit: usize) -> String {
    let mut units = 0;
    text.chars()
        .take_while(|character| {
            units += character.len_utf16();
            units <= limit
        })
        .collect()
}

/// Everything the host frame is told about a selected element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementSnapshot {
    /// The element's bridge identifier
    pub id: String,
    /// Lower-case tag name
    pub tag_name: String,
    /// Class list, empty when absent or not a plain string
    pub class_name: String,
    /// The start of the element's rendered text
    pub inner_text: String,
    /// Rendered size
    pub rect: Size,
    /// A fixed selection of computed styles
    pub styles: StyleSnapshot,
    /// Where the element came from in the application source
    pub source: SourceLocation,
}

/// Width and height of an element's box.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    /// Box width
    pub width: f64,
    /// Box height
    pub height: f64,
}

/// Source location recorded on an element by the build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceLocation {
    /// Source file, `"Unknown"` when the element carries none
    pub file_name: String,
    /// Source line, `"0"` when the element carries none; omitted for
    /// highlight-triggered snapshots
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<String>,
}

/// The computed styles reported for a selected element.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct StyleSnapshot {
    pub color: String,
    pub background_color: String,
    pub font_size: String,
    pub font_weight: String,
    pub font_family: String,
    pub padding: String,
    pub margin: String,
    pub display: String,
    pub flex_direction: String,
    pub justify_content: String,
    pub align_items: String,
    pub width: String,
    pub height: String,
    pub border: String,
    pub border_radius: String,
}

impl StyleSnapshot {
    /// Read the tracked properties from the element's computed style.
    pub fn capture<D: Dom>(dom: &D, node: &D::Node) -> Self {
        let read = |property: &str| dom.computed_style(node, property);
        Self {
            color: read("color"),
            background_color: read("backgroundColor"),
            font_size: read("fontSize"),
            font_weight: read("fontWeight"),
            font_family: read("fontFamily"),
            padding: read("padding"),
            margin: read("margin"),
            display: read("display"),
            flex_direction: read("flexDirection"),
            justify_content: read("justifyContent"),
            align_items: read("alignItems"),
            width: read("width"),
            height: read("height"),
            border: read("border"),
            border_radius: read("borderRadius"),
        }
    }
}

impl ElementSnapshot {
    /// Describe `node`, which must already carry identifier `id`.
    ///
    /// The source line is only included when `with_line` is set.
    pub fn capture<D: Dom>(dom: &D, node: &D::Node, id: String, with_line: bool) -> Self {
        let rect = dom.bounding_rect(node).unwrap_or_default();
        let inner_text = dom
            .inner_text(node)
            .map(|text| truncate_utf16(&text, INNER_TEXT_LIMIT))
            .unwrap_or_default();
        let file_name = dom
            .attribute(node, SOURCE_FILE_ATTRIBUTE)
            .filter(|file| !file.is_empty())
            .unwrap_or_else(|| "Unknown".to_string());
        let line_number = with_line.then(|| {
            dom.attribute(node, SOURCE_LINE_ATTRIBUTE)
                .filter(|line| !line.is_empty())
                .unwrap_or_else(|| "0".to_string())
        });

        Self {
            id,
            tag_name: dom.tag_name(node).to_lowercase(),
            class_name: dom.class_name(node).unwrap_or_default(),
            inner_text,
            rect: Size {
                width: rect.width,
                height: rect.height,
            },
            styles: StyleSnapshot::capture(dom, node),
            source: SourceLocation {
                file_name,
                line_number,
            },
        }
    }
}
