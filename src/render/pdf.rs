//! Writing laid-out pages as a PDF document.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};

use crate::config::LayoutConfig;
use crate::error::Result;
use crate::model::story::Story;
use crate::render::layout::{layout_story, LaidOutPage, PageSize};

/// Resource name of the body font in every page's `/Font` dictionary.
const FONT_NAME: &str = "F1";

/// Lay out `story` on pages of `size` and serialize it as PDF bytes.
pub fn render_story(story: &Story, size: PageSize, cfg: &LayoutConfig) -> Result<Vec<u8>> {
    let pages = layout_story(story, size, cfg);
    tracing::debug!(
        paragraphs = story.len(),
        pages = pages.len(),
        "Laid out story"
    );
    render_pages(&pages, size, cfg.font_size)
}

/// Serialize already laid-out pages. Every page shares one Helvetica font
/// resource.
pub fn render_pages(pages: &[LaidOutPage], size: PageSize, font_size: f32) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { FONT_NAME => font_id },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for page in pages {
        let page_id = add_text_page(&mut doc, page, pages_id, resources_id, size, font_size)?;
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    doc.compress();
    let mut out = Vec::new();
    doc.save_to(&mut out)?;
    Ok(out)
}

fn add_text_page(
    doc: &mut Document,
    page: &LaidOutPage,
    parent: ObjectId,
    resources: ObjectId,
    size: PageSize,
    font_size: f32,
) -> Result<ObjectId> {
    let mut operations = Vec::with_capacity(page.lines.len() * 2 + 3);
    operations.push(Operation::new("BT", vec![]));
    operations.push(Operation::new(
        "Tf",
        vec![Object::Name(FONT_NAME.as_bytes().to_vec()), font_size.into()],
    ));
    for line in &page.lines {
        operations.push(Operation::new(
            "Tm",
            vec![
                1.0.into(),
                0.0.into(),
                0.0.into(),
                1.0.into(),
                line.x.into(),
                line.y.into(),
            ],
        ));
        // Hex strings need no escaping of parentheses or backslashes.
        operations.push(Operation::new(
            "Tj",
            vec![Object::String(line.text.clone(), StringFormat::Hexadecimal)],
        ));
    }
    operations.push(Operation::new("ET", vec![]));

    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => parent,
        "MediaBox" => vec![0.0.into(), 0.0.into(), size.width.into(), size.height.into()],
        "Contents" => content_id,
        "Resources" => resources,
    }))
}
