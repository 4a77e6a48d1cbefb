//! Page composition: the rendered message text followed by its attachments.
//!
//! The base document is the story rendered on US Letter. Each part carrying
//! a disposition is then appended in encounter order: every page of a PDF
//! attachment, or one synthesized page per JPEG/PNG image. Anything else is
//! skipped.

use image::DynamicImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use serde::Serialize;
use tracing::debug;

use crate::config::LayoutConfig;
use crate::error::{ConvertError, Result};
use crate::model::message::{ImageKind, Message, Part, PartKind};
use crate::model::story::Story;
use crate::render::layout::PageSize;
use crate::render::pdf::render_story;

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic `/Parent` chains in malformed files.
const MAX_TREE_DEPTH: usize = 64;

/// What the compositor added on top of the rendered text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompositionStats {
    /// Pages produced by rendering the story.
    pub body_pages: usize,
    /// Pages copied from PDF attachments.
    pub attachment_pages: usize,
    /// Pages synthesized for image attachments.
    pub image_pages: usize,
    /// Parts with a disposition whose type is not supported.
    pub skipped_parts: usize,
}

/// Render `story` and append the supported attachments of `message`.
pub fn compose_message(
    message: &Message,
    story: &Story,
    cfg: &LayoutConfig,
) -> Result<(Vec<u8>, CompositionStats)> {
    let base = render_story(story, PageSize::LETTER, cfg)?;
    let mut pages = PageCollection::from_bytes(&base)?;
    let size = pages.first_page_size()?;

    let mut stats = CompositionStats {
        body_pages: pages.page_count(),
        ..CompositionStats::default()
    };

    for part in message.walk() {
        if part.is_multipart() || part.disposition.is_none() {
            continue;
        }
        match part.kind() {
            PartKind::PdfAttachment => {
                let added = pages.append_pdf(part.body()?)?;
                debug!(part = part.label(), pages = added, "Appended PDF attachment");
                stats.attachment_pages += added;
            }
            PartKind::ImageAttachment(kind) => {
                let image = decode_image(part, kind)?;
                pages.append_image(&image, size)?;
                debug!(
                    part = part.label(),
                    width = image.width(),
                    height = image.height(),
                    "Appended image attachment"
                );
                stats.image_pages += 1;
            }
            PartKind::PlainText | PartKind::Unsupported | PartKind::Multipart => {
                debug!(part = part.label(), "Skipping unsupported attachment");
                stats.skipped_parts += 1;
            }
        }
    }

    Ok((pages.to_bytes()?, stats))
}

/// Sniff the format from the data first; fall back to the declared type.
fn decode_image(part: &Part, kind: ImageKind) -> Result<DynamicImage> {
    let bytes = part.body()?;
    match image::load_from_memory(bytes) {
        Ok(image) => Ok(image),
        Err(_) => Ok(image::load_from_memory_with_format(bytes, kind.format())?),
    }
}

// ── Page collection ─────────────────────────────────────────────

/// An editable PDF whose page tree can be extended.
///
/// New pages are attached directly under the root `/Pages` node.
pub struct PageCollection {
    doc: Document,
    pages_id: ObjectId,
}

impl PageCollection {
    /// Load a document from memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let doc = Document::load_mem(bytes)?;
        let pages_id = root_pages_id(&doc)?;
        Ok(Self { doc, pages_id })
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Width and height of the first page's MediaBox.
    pub fn first_page_size(&self) -> Result<PageSize> {
        let first = self
            .doc
            .get_pages()
            .into_values()
            .next()
            .ok_or_else(|| ConvertError::InvalidPdf("document has no pages".into()))?;
        media_box_size(&self.doc, first)
    }

    /// Append every page of the PDF in `bytes`, in order. Returns the number
    /// of pages added.
    pub fn append_pdf(&mut self, bytes: &[u8]) -> Result<usize> {
        let mut other = Document::load_mem(bytes)?;

        let source_pages: Vec<ObjectId> = other.get_pages().into_values().collect();
        if source_pages.is_empty() {
            return Err(ConvertError::InvalidPdf("attachment has no pages".into()));
        }
        for &page_id in &source_pages {
            flatten_inherited(&mut other, page_id)?;
        }

        other.renumber_objects_with(self.doc.max_id + 1);
        let page_ids: Vec<ObjectId> = other.get_pages().into_values().collect();
        self.doc.max_id = self.doc.max_id.max(other.max_id);

        for (id, object) in other.objects {
            // The attachment's own catalog and page tree are replaced by ours.
            if matches!(type_name(&object), Some(b"Catalog" | b"Pages")) {
                continue;
            }
            self.doc.objects.insert(id, object);
        }

        for &page_id in &page_ids {
            self.doc
                .get_object_mut(page_id)?
                .as_dict_mut()?
                .set("Parent", self.pages_id);
            self.push_kid(page_id)?;
        }
        Ok(page_ids.len())
    }

    /// Append a page of `size` showing `image` centered at 1 px = 1 pt.
    ///
    /// Images larger than the page keep their size and are cropped.
    pub fn append_image(&mut self, image: &DynamicImage, size: PageSize) -> Result<()> {
        let (width, height) = (image.width(), image.height());

        let mut image_dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        };
        if image.color().has_alpha() {
            let alpha: Vec<u8> = image.to_rgba8().pixels().map(|p| p.0[3]).collect();
            let smask_id = self.doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => width as i64,
                    "Height" => height as i64,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                },
                alpha,
            ));
            image_dict.set("SMask", smask_id);
        }
        let image_id = self
            .doc
            .add_object(Stream::new(image_dict, image.to_rgb8().into_raw()));

        let (x, y) = centered_offset(width, height, size);
        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        (width as f32).into(),
                        0.0.into(),
                        0.0.into(),
                        (height as f32).into(),
                        x.into(),
                        y.into(),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = self
            .doc
            .add_object(Stream::new(dictionary! {}, content.encode()?));

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0.0.into(), 0.0.into(), size.width.into(), size.height.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => image_id },
            },
        });
        self.push_kid(page_id)
    }

    /// Serialize the collection.
    pub fn to_bytes(mut self) -> Result<Vec<u8>> {
        self.doc.compress();
        let mut out = Vec::new();
        self.doc.save_to(&mut out)?;
        Ok(out)
    }

    fn push_kid(&mut self, page_id: ObjectId) -> Result<()> {
        let pages = self.doc.get_object_mut(self.pages_id)?.as_dict_mut()?;
        let count = pages.get(b"Count").and_then(Object::as_i64).unwrap_or(0);
        pages.get_mut(b"Kids")?.as_array_mut()?.push(page_id.into());
        pages.set("Count", count + 1);
        Ok(())
    }
}

/// Lower-left offset that centers a `width` × `height` image on `page`.
/// Negative when the image is larger than the page.
pub fn centered_offset(width: u32, height: u32, page: PageSize) -> (f32, f32) {
    (
        (page.width - width as f32) / 2.0,
        (page.height - height as f32) / 2.0,
    )
}

// ── Page tree helpers ───────────────────────────────────────────

fn root_pages_id(doc: &Document) -> Result<ObjectId> {
    let root = doc.trailer.get(b"Root")?.as_reference()?;
    Ok(doc.get_dictionary(root)?.get(b"Pages")?.as_reference()?)
}

fn type_name(object: &Object) -> Option<&[u8]> {
    object.as_dict().ok()?.get(b"Type").ok()?.as_name().ok()
}

/// Look up `key` on the page, then on each ancestor.
fn inherited_attribute<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut node_id = page_id;
    for _ in 0..MAX_TREE_DEPTH {
        let node = doc.get_dictionary(node_id).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value);
        }
        node_id = node.get(b"Parent").and_then(Object::as_reference).ok()?;
    }
    None
}

/// Copy inherited attributes onto the page so it survives re-parenting.
fn flatten_inherited(doc: &mut Document, page_id: ObjectId) -> Result<()> {
    let inherited: Vec<(&[u8], Object)> = INHERITABLE
        .iter()
        .filter_map(|&key| inherited_attribute(doc, page_id, key).map(|v| (key, v.clone())))
        .collect();

    let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
    for (key, value) in inherited {
        if !page.has(key) {
            page.set(key, value);
        }
    }
    Ok(())
}

fn media_box_size(doc: &Document, page_id: ObjectId) -> Result<PageSize> {
    let invalid = || ConvertError::InvalidPdf("first page has no usable MediaBox".into());

    let media_box = inherited_attribute(doc, page_id, b"MediaBox").ok_or_else(invalid)?;
    let media_box = match media_box {
        Object::Reference(id) => doc.get_object(*id)?,
        other => other,
    };
    let corners: Vec<f32> = media_box
        .as_array()
        .map_err(|_| invalid())?
        .iter()
        .filter_map(number)
        .collect();

    match corners.as_slice() {
        [llx, lly, urx, ury] => Ok(PageSize {
            width: (urx - llx).abs(),
            height: (ury - lly).abs(),
        }),
        _ => Err(invalid()),
    }
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}
