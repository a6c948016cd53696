//! Structural color detection: resource-dictionary inspection without
//! rendering.
//!
//! Used by the quick (server-side) analysis path, which has the parsed
//! object tree but no rasterization budget. A page is chromatic if any
//! entry of its declared ColorSpace dictionary resolves to a chromatic
//! space, or if any image or form XObject it references declares one.

use std::collections::HashSet;

use lazy_static::lazy_static;
use lopdf::{Dictionary, Document, Object};

use super::{as_number, inherited_page_attribute, resolve, ColorDetector, PageHandle};
use crate::error::AnalysisError;

/// Nested color spaces and form resources deeper than this are treated as
/// not color, keeping malformed self-referential documents from recursing
const MAX_RECURSION: usize = 8;

lazy_static! {
    static ref CHROMATIC_SPACE_NAMES: HashSet<&'static [u8]> = {
        let mut names: HashSet<&'static [u8]> = HashSet::new();
        names.insert(b"DeviceRGB");
        names.insert(b"DeviceCMYK");
        names.insert(b"CalRGB");
        names.insert(b"CalCMYK");
        names.insert(b"Lab");
        names
    };
}

/// Resource-dictionary color detector
pub struct StructuralDetector;

impl ColorDetector for StructuralDetector {
    fn classify(&self, page: &PageHandle<'_>) -> Result<bool, AnalysisError> {
        let resources = match inherited_page_attribute(page.doc, page.id, b"Resources") {
            Some(object) => match object.as_dict() {
                Ok(dict) => dict,
                Err(err) => {
                    return Err(AnalysisError::PageAnalysis {
                        page: page.number,
                        reason: format!("malformed resource dictionary: {err}"),
                    })
                }
            },
            // No resource dictionary at all: nothing declares color
            None => return Ok(false),
        };
        Ok(resources_declare_color(page.doc, resources, 0))
    }
}

fn resources_declare_color(doc: &Document, resources: &Dictionary, depth: usize) -> bool {
    if depth > MAX_RECURSION {
        return false;
    }
    if let Ok(spaces) = resources.get(b"ColorSpace") {
        if let Ok(spaces) = resolve(doc, spaces).as_dict() {
            for (_, space) in spaces.iter() {
                if space_is_chromatic(doc, space, depth + 1) {
                    return true;
                }
            }
        }
    }
    if let Ok(xobjects) = resources.get(b"XObject") {
        if let Ok(xobjects) = resolve(doc, xobjects).as_dict() {
            for (_, candidate) in xobjects.iter() {
                if xobject_declares_color(doc, resolve(doc, candidate), depth + 1) {
                    return true;
                }
            }
        }
    }
    false
}

fn xobject_declares_color(doc: &Document, object: &Object, depth: usize) -> bool {
    if depth > MAX_RECURSION {
        return false;
    }
    let stream = match object {
        Object::Stream(stream) => stream,
        _ => return false,
    };
    if let Ok(space) = stream.dict.get(b"ColorSpace") {
        if space_is_chromatic(doc, space, depth + 1) {
            return true;
        }
    }
    // Form XObjects carry their own nested resource dictionary
    if let Ok(resources) = stream.dict.get(b"Resources") {
        if let Ok(resources) = resolve(doc, resources).as_dict() {
            return resources_declare_color(doc, resources, depth + 1);
        }
    }
    false
}

/// Recursively decides whether a color-space object resolves to a chromatic
/// space. Anything unrecognized or malformed is not chromatic.
fn space_is_chromatic(doc: &Document, object: &Object, depth: usize) -> bool {
    if depth > MAX_RECURSION {
        return false;
    }
    match resolve(doc, object) {
        Object::Name(name) => CHROMATIC_SPACE_NAMES.contains(name.as_slice()),
        Object::Array(parts) => {
            let family = match parts.first().map(|part| resolve(doc, part)) {
                Some(Object::Name(name)) => name.as_slice(),
                _ => return false,
            };
            match family {
                b"ICCBased" => icc_is_chromatic(doc, parts.get(1), depth),
                b"Indexed" => parts
                    .get(1)
                    .map_or(false, |base| space_is_chromatic(doc, base, depth + 1)),
                // [/Separation name alternate tint] and [/DeviceN names alternate tint]
                b"Separation" | b"DeviceN" => parts
                    .get(2)
                    .map_or(false, |alternate| space_is_chromatic(doc, alternate, depth + 1)),
                b"Pattern" => parts
                    .get(1)
                    .map_or(false, |under| space_is_chromatic(doc, under, depth + 1)),
                other => CHROMATIC_SPACE_NAMES.contains(other),
            }
        }
        _ => false,
    }
}

/// ICCBased: component count N > 1 is chromatic; with N absent, fall back
/// to the Alternate space.
fn icc_is_chromatic(doc: &Document, stream_object: Option<&Object>, depth: usize) -> bool {
    let stream = match stream_object.map(|object| resolve(doc, object)) {
        Some(Object::Stream(stream)) => stream,
        _ => return false,
    };
    match stream.dict.get(b"N").ok().and_then(|n| as_number(resolve(doc, n))) {
        Some(components) => components > 1.0,
        None => stream
            .dict
            .get(b"Alternate")
            .map_or(false, |alternate| space_is_chromatic(doc, alternate, depth + 1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Stream};

    fn name(value: &[u8]) -> Object {
        Object::Name(value.to_vec())
    }

    /// Builds a one-page document whose page carries the given resources
    fn doc_with_resources(resources: Dictionary) -> (Document, lopdf::ObjectId) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => name(b"Page"),
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => Object::Dictionary(resources),
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => name(b"Pages"),
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => name(b"Catalog"),
            "Pages" => Object::Reference(pages_id),
        });
        doc.trailer.set("Root", Object::Reference(catalog_id));
        (doc, page_id)
    }

    fn classify(resources: Dictionary) -> bool {
        let (doc, page_id) = doc_with_resources(resources);
        let page = PageHandle {
            doc: &doc,
            id: page_id,
            number: 1,
        };
        StructuralDetector.classify(&page).unwrap()
    }

    #[test]
    fn device_gray_only_is_not_color() {
        let resources = dictionary! {
            "ColorSpace" => Object::Dictionary(dictionary! {
                "CS0" => name(b"DeviceGray"),
            }),
        };
        assert!(!classify(resources));
    }

    #[test]
    fn device_rgb_is_color() {
        let resources = dictionary! {
            "ColorSpace" => Object::Dictionary(dictionary! {
                "CS0" => name(b"DeviceRGB"),
            }),
        };
        assert!(classify(resources));
    }

    #[test]
    fn icc_component_count_decides() {
        let (mut doc, page_id) = doc_with_resources(Dictionary::new());
        let icc_id = doc.add_object(Object::Stream(Stream::new(
            dictionary! { "N" => 3 },
            Vec::new(),
        )));
        let resources = dictionary! {
            "ColorSpace" => Object::Dictionary(dictionary! {
                "CS0" => vec![name(b"ICCBased"), Object::Reference(icc_id)],
            }),
        };
        if let Ok(Object::Dictionary(page)) = doc.get_object_mut(page_id) {
            page.set("Resources", Object::Dictionary(resources));
        }
        let page = PageHandle {
            doc: &doc,
            id: page_id,
            number: 1,
        };
        assert!(StructuralDetector.classify(&page).unwrap());
    }

    #[test]
    fn icc_single_component_is_not_color() {
        let (mut doc, page_id) = doc_with_resources(Dictionary::new());
        let icc_id = doc.add_object(Object::Stream(Stream::new(
            dictionary! { "N" => 1 },
            Vec::new(),
        )));
        let resources = dictionary! {
            "ColorSpace" => Object::Dictionary(dictionary! {
                "CS0" => vec![name(b"ICCBased"), Object::Reference(icc_id)],
            }),
        };
        if let Ok(Object::Dictionary(page)) = doc.get_object_mut(page_id) {
            page.set("Resources", Object::Dictionary(resources));
        }
        let page = PageHandle {
            doc: &doc,
            id: page_id,
            number: 1,
        };
        assert!(!StructuralDetector.classify(&page).unwrap());
    }

    #[test]
    fn icc_without_n_falls_back_to_alternate() {
        let (mut doc, page_id) = doc_with_resources(Dictionary::new());
        let icc_id = doc.add_object(Object::Stream(Stream::new(
            dictionary! { "Alternate" => name(b"DeviceRGB") },
            Vec::new(),
        )));
        let resources = dictionary! {
            "ColorSpace" => Object::Dictionary(dictionary! {
                "CS0" => vec![name(b"ICCBased"), Object::Reference(icc_id)],
            }),
        };
        if let Ok(Object::Dictionary(page)) = doc.get_object_mut(page_id) {
            page.set("Resources", Object::Dictionary(resources));
        }
        let page = PageHandle {
            doc: &doc,
            id: page_id,
            number: 1,
        };
        assert!(StructuralDetector.classify(&page).unwrap());
    }

    #[test]
    fn indexed_recurses_into_base() {
        let resources = dictionary! {
            "ColorSpace" => Object::Dictionary(dictionary! {
                "CS0" => vec![name(b"Indexed"), name(b"DeviceRGB"), 255.into(),
                    Object::string_literal("")],
            }),
        };
        assert!(classify(resources));

        let resources = dictionary! {
            "ColorSpace" => Object::Dictionary(dictionary! {
                "CS0" => vec![name(b"Indexed"), name(b"DeviceGray"), 255.into(),
                    Object::string_literal("")],
            }),
        };
        assert!(!classify(resources));
    }

    #[test]
    fn separation_recurses_into_alternate() {
        let resources = dictionary! {
            "ColorSpace" => Object::Dictionary(dictionary! {
                "CS0" => vec![name(b"Separation"), name(b"Spot1"), name(b"DeviceCMYK")],
            }),
        };
        assert!(classify(resources));
    }

    #[test]
    fn chromatic_image_xobject_is_color() {
        let (mut doc, page_id) = doc_with_resources(Dictionary::new());
        let image_id = doc.add_object(Object::Stream(Stream::new(
            dictionary! {
                "Subtype" => name(b"Image"),
                "ColorSpace" => name(b"DeviceRGB"),
            },
            Vec::new(),
        )));
        let resources = dictionary! {
            "XObject" => Object::Dictionary(dictionary! {
                "Im0" => Object::Reference(image_id),
            }),
        };
        if let Ok(Object::Dictionary(page)) = doc.get_object_mut(page_id) {
            page.set("Resources", Object::Dictionary(resources));
        }
        let page = PageHandle {
            doc: &doc,
            id: page_id,
            number: 1,
        };
        assert!(StructuralDetector.classify(&page).unwrap());
    }

    #[test]
    fn form_xobject_nested_resources_are_inspected() {
        let (mut doc, page_id) = doc_with_resources(Dictionary::new());
        let form_id = doc.add_object(Object::Stream(Stream::new(
            dictionary! {
                "Subtype" => name(b"Form"),
                "Resources" => Object::Dictionary(dictionary! {
                    "ColorSpace" => Object::Dictionary(dictionary! {
                        "CS0" => name(b"CalRGB"),
                    }),
                }),
            },
            Vec::new(),
        )));
        let resources = dictionary! {
            "XObject" => Object::Dictionary(dictionary! {
                "Fm0" => Object::Reference(form_id),
            }),
        };
        if let Ok(Object::Dictionary(page)) = doc.get_object_mut(page_id) {
            page.set("Resources", Object::Dictionary(resources));
        }
        let page = PageHandle {
            doc: &doc,
            id: page_id,
            number: 1,
        };
        assert!(StructuralDetector.classify(&page).unwrap());
    }

    #[test]
    fn missing_resources_default_to_bw() {
        let mut doc = Document::with_version("1.5");
        let page_id = doc.add_object(dictionary! {
            "Type" => name(b"Page"),
        });
        let page = PageHandle {
            doc: &doc,
            id: page_id,
            number: 1,
        };
        assert!(!StructuralDetector.classify(&page).unwrap());
    }
}
