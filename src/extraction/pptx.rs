//! Presentation (PPTX) text extraction.

use crate::extraction::ExtractionError;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};
use zip::ZipArchive;
use zip::result::ZipError;

const PRESENTATION_PART: &str = "ppt/presentation.xml";
const PRESENTATION_RELS: &str = "ppt/_rels/presentation.xml.rels";
const SLIDE_PREFIX: &str = "ppt/slides/slide";
const SLIDE_SUFFIX: &str = ".xml";

/// Extract text-frame text from every slide in presentation order. Slides without text are
/// skipped.
///
/// The order comes from the slide id list in `ppt/presentation.xml`. Archives without that part
/// fall back to the number in each `slideN.xml` name.
pub fn extract(data: &[u8]) -> Result<String, ExtractionError> {
    let mut archive =
        ZipArchive::new(Cursor::new(data)).map_err(|error| ExtractionError::parse("pptx", error))?;

    let slides = match presentation_order(&mut archive)? {
        Some(slides) => slides,
        None => numbered_slides(&archive),
    };

    let mut texts = Vec::with_capacity(slides.len());
    for name in slides {
        let Some(xml) = read_part(&mut archive, &name)? else {
            tracing::warn!(part = %name, "Slide listed in presentation is missing");
            continue;
        };
        let text = slide_text(&xml)?;
        if text.trim().is_empty() {
            tracing::trace!(part = %name, "Slide has no text");
            continue;
        }
        texts.push(text);
    }

    Ok(texts.join("\n"))
}

/// Slide part names in the order the presentation lists them, or `None` without a
/// `ppt/presentation.xml`.
fn presentation_order<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
) -> Result<Option<Vec<String>>, ExtractionError> {
    let Some(presentation) = read_part(archive, PRESENTATION_PART)? else {
        return Ok(None);
    };
    let ids = slide_relationship_ids(&presentation)?;
    let targets = match read_part(archive, PRESENTATION_RELS)? {
        Some(rels) => relationship_targets(&rels)?,
        None => HashMap::new(),
    };

    let slides = ids
        .into_iter()
        .filter_map(|id| match targets.get(&id) {
            Some(target) => Some(resolve_target(target)),
            None => {
                tracing::warn!(relationship = %id, "Slide relationship not found");
                None
            }
        })
        .collect();
    Ok(Some(slides))
}

fn numbered_slides<R: Read + Seek>(archive: &ZipArchive<R>) -> Vec<String> {
    let mut slides: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| slide_number(name).map(|number| (number, name.to_string())))
        .collect();
    slides.sort_by_key(|(number, _)| *number);
    slides.into_iter().map(|(_, name)| name).collect()
}

fn slide_number(name: &str) -> Option<u32> {
    name.strip_prefix(SLIDE_PREFIX)?
        .strip_suffix(SLIDE_SUFFIX)?
        .parse()
        .ok()
}

fn read_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<String>, ExtractionError> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(error) => return Err(ExtractionError::parse("pptx", error)),
    };
    let mut xml = String::new();
    file.read_to_string(&mut xml)
        .map_err(|error| ExtractionError::parse("pptx", error))?;
    Ok(Some(xml))
}

/// `r:id` of every `p:sldId` in `p:sldIdLst`, in document order.
fn slide_relationship_ids(xml: &str) -> Result<Vec<String>, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    let mut ids = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(element) | Event::Empty(element))
                if element.name().as_ref() == b"p:sldId" =>
            {
                if let Some(id) = attribute(&element, b"r:id")? {
                    ids.push(id);
                }
            }
            Ok(Event::Eof) => break,
            Err(error) => return Err(ExtractionError::parse("pptx", error)),
            _ => {}
        }
    }
    Ok(ids)
}

/// Relationship id to target map from a `.rels` part.
fn relationship_targets(xml: &str) -> Result<HashMap<String, String>, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    let mut targets = HashMap::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(element) | Event::Empty(element))
                if element.name().as_ref() == b"Relationship" =>
            {
                if let (Some(id), Some(target)) =
                    (attribute(&element, b"Id")?, attribute(&element, b"Target")?)
                {
                    targets.insert(id, target);
                }
            }
            Ok(Event::Eof) => break,
            Err(error) => return Err(ExtractionError::parse("pptx", error)),
            _ => {}
        }
    }
    Ok(targets)
}

fn attribute(element: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>, ExtractionError> {
    for attr in element.attributes() {
        let attr = attr.map_err(|error| ExtractionError::parse("pptx", error))?;
        if attr.key.as_ref() == key {
            let value = attr
                .unescape_value()
                .map_err(|error| ExtractionError::parse("pptx", error))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Relationship targets are relative to `ppt/` unless absolute within the package.
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("ppt/{target}"),
    }
}

/// Text of every shape text frame (`p:txBody`) on the slide. Paragraphs within a frame and
/// frames within a slide are separated by newlines.
fn slide_text(xml: &str) -> Result<String, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    let mut frames: Vec<String> = Vec::new();
    let mut paragraphs: Vec<String> = Vec::new();
    let mut paragraph = String::new();
    let mut in_frame = false;
    let mut in_paragraph = false;
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => match element.name().as_ref() {
                b"p:txBody" => {
                    in_frame = true;
                    paragraphs.clear();
                }
                b"a:p" if in_frame => {
                    in_paragraph = true;
                    paragraph.clear();
                }
                b"a:t" if in_paragraph => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(element)) => match element.name().as_ref() {
                b"a:p" if in_frame => paragraphs.push(String::new()),
                b"a:br" if in_paragraph => paragraph.push('\n'),
                _ => {}
            },
            Ok(Event::Text(text)) if in_text => {
                let unescaped = text
                    .unescape()
                    .map_err(|error| ExtractionError::parse("pptx", error))?;
                paragraph.push_str(&unescaped);
            }
            Ok(Event::End(element)) => match element.name().as_ref() {
                b"a:t" => in_text = false,
                b"a:p" if in_paragraph => {
                    in_paragraph = false;
                    paragraphs.push(std::mem::take(&mut paragraph));
                }
                b"p:txBody" if in_frame => {
                    in_frame = false;
                    frames.push(paragraphs.join("\n"));
                    paragraphs.clear();
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(error) => return Err(ExtractionError::parse("pptx", error)),
            _ => {}
        }
    }

    Ok(frames.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn shape(paragraphs: &str) -> String {
        format!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Shape"/></p:nvSpPr><p:txBody><a:bodyPr/>{paragraphs}</p:txBody></p:sp>"#
        )
    }

    fn slide(shapes: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree>{shapes}</p:spTree></p:cSld></p:sld>"#
        )
    }

    fn presentation(slides: &[(&str, String)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, contents) in slides {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .expect("start file");
            writer.write_all(contents.as_bytes()).expect("write file");
        }
        writer.finish().expect("finish zip").into_inner()
    }

    #[test]
    fn slides_without_presentation_part_follow_file_numbers() {
        let table = r#"<p:graphicFrame><a:graphic><a:graphicData><a:tbl><a:tr><a:tc><a:txBody><a:p><a:r><a:t>Cell text</a:t></a:r></a:p></a:txBody></a:tc></a:tr></a:tbl></a:graphicData></a:graphic></p:graphicFrame>"#;
        let bytes = presentation(&[
            ("ppt/slides/slide10.xml", slide(&shape("<a:p><a:r><a:t>Appendix</a:t></a:r></a:p>"))),
            (
                "ppt/slides/slide2.xml",
                slide(&format!(
                    "{}{table}",
                    shape("<a:p><a:r><a:t>Next steps</a:t></a:r></a:p>")
                )),
            ),
            ("ppt/slides/slide3.xml", slide(&shape("<a:p/>"))),
            (
                "ppt/slides/slide1.xml",
                slide(&format!(
                    "{}{}",
                    shape("<a:p><a:r><a:t>Quarterly Review</a:t></a:r></a:p>"),
                    shape(
                        "<a:p><a:r><a:t>Revenue </a:t></a:r><a:r><a:t>up</a:t></a:r></a:p><a:p><a:r><a:t>Costs down &amp; stable</a:t></a:r></a:p>"
                    )
                )),
            ),
            (
                "ppt/slides/_rels/slide1.xml.rels",
                "<Relationships/>".to_string(),
            ),
        ]);

        let text = extract(&bytes).expect("pptx text");
        assert_eq!(
            text,
            "Quarterly Review\nRevenue up\nCosts down & stable\nNext steps\nAppendix"
        );
    }

    #[test]
    fn line_breaks_inside_paragraphs_are_kept() {
        let xml = slide(&shape(
            "<a:p><a:r><a:t>first</a:t></a:r><a:br/><a:r><a:t>second</a:t></a:r></a:p>",
        ));
        assert_eq!(slide_text(&xml).expect("slide"), "first\nsecond");
    }

    #[test]
    fn presentation_without_slides_is_empty() {
        let bytes = presentation(&[("ppt/presentation.xml", "<p:presentation/>".to_string())]);
        assert_eq!(extract(&bytes).expect("pptx text"), "");
    }

    #[test]
    fn slide_numbers_ignore_other_parts() {
        assert_eq!(slide_number("ppt/slides/slide7.xml"), Some(7));
        assert_eq!(slide_number("ppt/slides/_rels/slide7.xml.rels"), None);
        assert_eq!(slide_number("ppt/slideLayouts/slideLayout1.xml"), None);
    }

    #[test]
    fn presentation_slide_list_sets_the_order() {
        let presentation_xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst><p:sldId id="257" r:id="rId3"/><p:sldId id="256" r:id="rId2"/></p:sldIdLst></p:presentation>"#;
        let rels = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="slideMasters/slideMaster1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide1.xml"/><Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="/ppt/slides/slide2.xml"/></Relationships>"#;
        let bytes = presentation(&[
            ("ppt/presentation.xml", presentation_xml.to_string()),
            ("ppt/_rels/presentation.xml.rels", rels.to_string()),
            ("ppt/slides/slide1.xml", slide(&shape("<a:p><a:r><a:t>Closing remarks</a:t></a:r></a:p>"))),
            ("ppt/slides/slide2.xml", slide(&shape("<a:p><a:r><a:t>Agenda</a:t></a:r></a:p>"))),
        ]);

        assert_eq!(extract(&bytes).expect("pptx text"), "Agenda\nClosing remarks");
    }

    #[test]
    fn slides_missing_from_the_list_are_not_read() {
        let presentation_xml = r#"<p:presentation xmlns:p="p" xmlns:r="r"><p:sldIdLst><p:sldId id="256" r:id="rId7"/></p:sldIdLst></p:presentation>"#;
        let rels = r#"<Relationships><Relationship Id="rId7" Target="slides/slide3.xml"/></Relationships>"#;
        let bytes = presentation(&[
            ("ppt/presentation.xml", presentation_xml.to_string()),
            ("ppt/_rels/presentation.xml.rels", rels.to_string()),
            ("ppt/slides/slide1.xml", slide(&shape("<a:p><a:r><a:t>Orphan</a:t></a:r></a:p>"))),
            ("ppt/slides/slide3.xml", slide(&shape("<a:p><a:r><a:t>Listed</a:t></a:r></a:p>"))),
        ]);

        assert_eq!(extract(&bytes).expect("pptx text"), "Listed");
    }

    #[test]
    fn relationship_targets_resolve_inside_the_package() {
        assert_eq!(resolve_target("slides/slide4.xml"), "ppt/slides/slide4.xml");
        assert_eq!(resolve_target("/ppt/slides/slide4.xml"), "ppt/slides/slide4.xml");
    }
}
