//! Operator-stream color detection: scans a page's drawing instructions
//! without executing them.
//!
//! Used by the full analysis path when the file is too large to rasterize
//! every page. Direct RGB/CMYK color-setting operators are chromatic
//! (except a gray value merely expressed in RGB form); color-space
//! declarations set per-channel flags consulted by the generic set-color
//! operators. The first chromatic finding short-circuits the scan.

use lopdf::content::{Content, Operation};
use lopdf::Object;

use super::{as_number, ColorDetector, PageHandle};
use crate::error::AnalysisError;

/// RGB channels closer than this are a gray expressed in RGB form
const GRAY_RGB_EPSILON: f64 = 0.01;

/// Space names that imply chromatic content at the operator level.
/// ICCBased is presumed chromatic here: the component count is not visible
/// in the instruction stream.
const CHROMATIC_SPACE_HINTS: [&str; 5] = ["RGB", "CMYK", "Lab", "CalRGB", "ICCBased"];

/// Drawing-instruction color detector
pub struct OperatorScanDetector;

impl ColorDetector for OperatorScanDetector {
    fn classify(&self, page: &PageHandle<'_>) -> Result<bool, AnalysisError> {
        let data = page
            .doc
            .get_page_content(page.id)
            .map_err(|err| AnalysisError::PageAnalysis {
                page: page.number,
                reason: format!("content stream unavailable: {err}"),
            })?;
        let content = Content::decode(&data).map_err(|err| AnalysisError::PageAnalysis {
            page: page.number,
            reason: format!("content stream undecodable: {err}"),
        })?;
        Ok(scan_operations(&content.operations))
    }
}

/// Sequential scan over decoded operations. Fill and stroke color spaces
/// are tracked independently.
fn scan_operations(operations: &[Operation]) -> bool {
    let mut fill_space_chromatic = false;
    let mut stroke_space_chromatic = false;
    for operation in operations {
        match operation.operator.as_str() {
            "rg" | "RG" => {
                if !is_gray_rgb(&operation.operands) {
                    return true;
                }
            }
            "k" | "K" => return true,
            "cs" => fill_space_chromatic = declares_chromatic_space(&operation.operands),
            "CS" => stroke_space_chromatic = declares_chromatic_space(&operation.operands),
            "sc" | "scn" => {
                if fill_space_chromatic {
                    return true;
                }
            }
            "SC" | "SCN" => {
                if stroke_space_chromatic {
                    return true;
                }
            }
            _ => {}
        }
    }
    false
}

/// True when all three RGB channels are equal within epsilon, or the
/// operands are malformed (uncertainty reads as gray)
fn is_gray_rgb(operands: &[Object]) -> bool {
    let channels: Vec<f64> = operands.iter().filter_map(as_number).collect();
    if channels.len() != 3 {
        return true;
    }
    let max = channels.iter().cloned().fold(f64::MIN, f64::max);
    let min = channels.iter().cloned().fold(f64::MAX, f64::min);
    max - min <= GRAY_RGB_EPSILON
}

fn declares_chromatic_space(operands: &[Object]) -> bool {
    let name = match operands.first() {
        Some(Object::Name(name)) => String::from_utf8_lossy(name).into_owned(),
        _ => return false,
    };
    CHROMATIC_SPACE_HINTS.iter().any(|hint| name.contains(hint))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Document, Stream};

    fn op(operator: &str, operands: Vec<Object>) -> Operation {
        Operation::new(operator, operands)
    }

    fn name(value: &[u8]) -> Object {
        Object::Name(value.to_vec())
    }

    #[test]
    fn rgb_fill_is_chromatic() {
        let ops = vec![op(
            "rg",
            vec![Object::Real(0.9), Object::Real(0.1), Object::Real(0.1)],
        )];
        assert!(scan_operations(&ops));
    }

    #[test]
    fn gray_expressed_as_rgb_is_not_chromatic() {
        let ops = vec![op(
            "rg",
            vec![Object::Real(0.5), Object::Real(0.5), Object::Real(0.5)],
        )];
        assert!(!scan_operations(&ops));
    }

    #[test]
    fn cmyk_is_always_chromatic() {
        let ops = vec![op(
            "k",
            vec![
                Object::Real(0.0),
                Object::Real(0.0),
                Object::Real(0.0),
                Object::Real(1.0),
            ],
        )];
        assert!(scan_operations(&ops));
    }

    #[test]
    fn gray_operators_are_ignored() {
        let ops = vec![
            op("g", vec![Object::Real(0.5)]),
            op("G", vec![Object::Real(0.2)]),
        ];
        assert!(!scan_operations(&ops));
    }

    #[test]
    fn set_color_uses_declared_fill_space() {
        let ops = vec![
            op("cs", vec![name(b"DeviceRGB")]),
            op("scn", vec![Object::Real(0.3)]),
        ];
        assert!(scan_operations(&ops));
    }

    #[test]
    fn set_color_in_gray_space_is_not_chromatic() {
        let ops = vec![
            op("cs", vec![name(b"DeviceGray")]),
            op("scn", vec![Object::Real(0.3)]),
        ];
        assert!(!scan_operations(&ops));
    }

    #[test]
    fn fill_and_stroke_spaces_are_tracked_independently() {
        // Chromatic fill space must not make a stroke set-color chromatic
        let ops = vec![
            op("cs", vec![name(b"DeviceRGB")]),
            op("CS", vec![name(b"DeviceGray")]),
            op("SC", vec![Object::Real(0.3)]),
        ];
        assert!(!scan_operations(&ops));
    }

    #[test]
    fn space_redeclaration_clears_the_flag() {
        let ops = vec![
            op("cs", vec![name(b"DeviceRGB")]),
            op("cs", vec![name(b"DeviceGray")]),
            op("scn", vec![Object::Real(0.3)]),
        ];
        assert!(!scan_operations(&ops));
    }

    #[test]
    fn icc_based_space_is_presumed_chromatic() {
        let ops = vec![
            op("cs", vec![name(b"ICCBased")]),
            op("scn", vec![Object::Real(0.3)]),
        ];
        assert!(scan_operations(&ops));
    }

    #[test]
    fn classify_reads_page_content_stream() {
        let mut doc = Document::with_version("1.5");
        let content = Content {
            operations: vec![op(
                "rg",
                vec![Object::Real(1.0), Object::Real(0.0), Object::Real(0.0)],
            )],
        };
        let stream_id = doc.add_object(Object::Stream(Stream::new(
            dictionary! {},
            content.encode().unwrap(),
        )));
        let page_id = doc.add_object(dictionary! {
            "Type" => name(b"Page"),
            "Contents" => Object::Reference(stream_id),
        });
        let page = PageHandle {
            doc: &doc,
            id: page_id,
            number: 1,
        };
        assert!(OperatorScanDetector.classify(&page).unwrap());
    }
}
