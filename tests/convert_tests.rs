//! Integration tests for the EML and text converters.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use base64::Engine as _;
use lopdf::content::Content;
use lopdf::{Document, Object};

use mailpdf::config::{Config, LayoutConfig};
use mailpdf::convert::eml::eml_to_pdf;
use mailpdf::convert::text::txt_to_pdf;
use mailpdf::error::ConvertError;
use mailpdf::model::story::{Paragraph, Story};
use mailpdf::render::pdf::render_story;
use mailpdf::render::PageSize;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

// ─── Helpers ────────────────────────────────────────────────────────

/// Text shown on each page, one string per `Tj`.
fn page_texts(pdf: &[u8]) -> Vec<Vec<String>> {
    let doc = Document::load_mem(pdf).unwrap();
    doc.get_pages()
        .into_values()
        .map(|id| {
            let content = Content::decode(&doc.get_page_content(id).unwrap()).unwrap();
            content
                .operations
                .iter()
                .filter(|op| op.operator == "Tj")
                .map(|op| {
                    let bytes = op.operands[0].as_str().unwrap();
                    encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned()
                })
                .collect()
        })
        .collect()
}

/// The `cm` matrix of each page that draws an image.
fn image_matrices(pdf: &[u8]) -> Vec<Option<Vec<f32>>> {
    let doc = Document::load_mem(pdf).unwrap();
    doc.get_pages()
        .into_values()
        .map(|id| {
            let content = Content::decode(&doc.get_page_content(id).unwrap()).unwrap();
            content
                .operations
                .iter()
                .find(|op| op.operator == "cm")
                .map(|op| {
                    op.operands
                        .iter()
                        .filter_map(|o| match o {
                            Object::Integer(i) => Some(*i as f32),
                            Object::Real(r) => Some(*r as f32),
                            _ => None,
                        })
                        .collect()
                })
        })
        .collect()
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        width,
        height,
        image::Rgb([0, 128, 255]),
    ));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageOutputFormat::Png).unwrap();
    buf.into_inner()
}

fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        width,
        height,
        image::Rgb([200, 10, 10]),
    ));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageOutputFormat::Jpeg(85))
        .unwrap();
    buf.into_inner()
}

fn pdf_bytes(lines: usize) -> Vec<u8> {
    let story: Story = (0..lines)
        .map(|i| Paragraph::new(format!("attachment line {i}")))
        .collect();
    render_story(&story, PageSize::A4, &LayoutConfig::default()).unwrap()
}

struct Attachment<'a> {
    content_type: &'a str,
    disposition: Option<&'a str>,
    body: Vec<u8>,
}

/// A multipart/mixed message with a plain text body followed by `attachments`,
/// each base64 encoded.
fn multipart_message(body: &str, attachments: &[Attachment]) -> Vec<u8> {
    let mut raw = String::from(
        "Subject: Documents\n\
         From: Office <office@example.com>\n\
         To: client@example.com\n\
         Date: Thu, 4 Jul 2024 08:00:00 +0000\n\
         MIME-Version: 1.0\n\
         Content-Type: multipart/mixed; boundary=\"SEP\"\n\
         \n\
         --SEP\n\
         Content-Type: text/plain; charset=utf-8\n\
         \n",
    );
    raw.push_str(body);
    raw.push('\n');

    for attachment in attachments {
        raw.push_str("--SEP\n");
        raw.push_str(&format!("Content-Type: {}\n", attachment.content_type));
        if let Some(disposition) = attachment.disposition {
            raw.push_str(&format!("Content-Disposition: {disposition}\n"));
        }
        raw.push_str("Content-Transfer-Encoding: base64\n\n");
        let encoded = base64::engine::general_purpose::STANDARD.encode(&attachment.body);
        for chunk in encoded.as_bytes().chunks(76) {
            raw.push_str(std::str::from_utf8(chunk).unwrap());
            raw.push('\n');
        }
    }
    raw.push_str("--SEP--\n");
    raw.into_bytes()
}

fn page_count(pdf: &[u8]) -> usize {
    Document::load_mem(pdf).unwrap().get_pages().len()
}

// ─── Headers and body ───────────────────────────────────────────────

#[test]
fn test_latin1_headers_and_body() {
    let raw = std::fs::read(fixture("latin1_headers.eml")).unwrap();
    let conversion = eml_to_pdf(&raw, &Config::default()).unwrap();
    assert_eq!(conversion.report.header_encoding.as_deref(), Some("iso-8859-1"));

    let pages = page_texts(&conversion.pdf);
    assert_eq!(pages.len(), 1);
    assert_eq!(
        pages[0],
        vec![
            "Subject: Réunion d'équipe",
            "From: André andre@example.com",
            "To: team@example.com",
            "Date: Wed, 3 Jul 2024 14:00:00 +0200",
            "Bonjour,",
            "Ordre du jour: café",
        ]
    );
}

#[test]
fn test_header_order_is_fixed() {
    let raw = b"Date: Fri, 5 Jul 2024 12:00:00 +0000\nTo: x@example.com\nFrom: y@example.com\nSubject: Order\n\nbody\n";
    let pages = page_texts(&eml_to_pdf(raw, &Config::default()).unwrap().pdf);
    let prefixes: Vec<&str> = pages[0]
        .iter()
        .take(4)
        .map(|line| line.split(':').next().unwrap())
        .collect();
    assert_eq!(prefixes, vec!["Subject", "From", "To", "Date"]);
}

#[test]
fn test_address_without_at_sign_is_untouched() {
    let raw = b"Subject: s\nFrom: Undisclosed <recipients>\nTo: <a@example.com>\n\n";
    let pages = page_texts(&eml_to_pdf(raw, &Config::default()).unwrap().pdf);
    assert_eq!(pages[0][1], "From: Undisclosed <recipients>");
    assert_eq!(pages[0][2], "To: a@example.com");
}

#[test]
fn test_single_header_encoding_is_used_for_body() {
    // UTF-8 body bytes read with the Latin-1 hint from the subject.
    let raw = "Subject: =?iso-8859-1?Q?caf=E9?=\n\ncafé\n".as_bytes();
    let pages = page_texts(&eml_to_pdf(raw, &Config::default()).unwrap().pdf);
    assert_eq!(pages[0][4], "cafÃ©");
}

#[test]
fn test_mixed_header_encodings_fall_back_for_the_body() {
    let raw = "Subject: =?utf-8?B?Y2Fmw6k=?=\nFrom: =?iso-8859-1?Q?Andr=E9?= <a@example.com>\n\ncafé\n"
        .as_bytes();
    let conversion = eml_to_pdf(raw, &Config::default()).unwrap();
    assert_eq!(conversion.report.header_encoding, None);
    let pages = page_texts(&conversion.pdf);
    assert_eq!(pages[0][0], "Subject: café");
    assert_eq!(pages[0][4], "café");
}

#[test]
fn test_long_body_spans_pages() {
    let body: String = (0..300).map(|i| format!("body line {i}\n")).collect();
    let raw = format!("Subject: long\n\n{body}");
    let conversion = eml_to_pdf(raw.as_bytes(), &Config::default()).unwrap();
    assert!(conversion.report.body_pages > 1);
    let pages = page_texts(&conversion.pdf);
    let all: Vec<&String> = pages.iter().flatten().collect();
    assert_eq!(all.last().map(|s| s.as_str()), Some("body line 299"));
}

// ─── Attachments ────────────────────────────────────────────────────

#[test]
fn test_pdf_attachment_pages_are_appended() {
    let attachment = pdf_bytes(150);
    let attachment_pages = page_count(&attachment);
    assert!(attachment_pages > 1);

    let raw = multipart_message(
        "Please find the report attached.",
        &[Attachment {
            content_type: "application/pdf; name=\"report.pdf\"",
            disposition: Some("attachment; filename=\"report.pdf\""),
            body: attachment,
        }],
    );
    let conversion = eml_to_pdf(&raw, &Config::default()).unwrap();
    let report = &conversion.report;
    assert_eq!(report.attachment_pages, attachment_pages);
    assert_eq!(
        page_count(&conversion.pdf),
        report.body_pages + attachment_pages
    );

    let pages = page_texts(&conversion.pdf);
    assert_eq!(pages[1][0], "attachment line 0");
}

#[test]
fn test_png_attachment_adds_one_centered_page() {
    let raw = multipart_message(
        "Photo attached.",
        &[Attachment {
            content_type: "image/png",
            disposition: Some("attachment; filename=\"photo.png\""),
            body: png_bytes(200, 100),
        }],
    );
    let conversion = eml_to_pdf(&raw, &Config::default()).unwrap();
    assert_eq!(conversion.report.image_pages, 1);
    assert_eq!(page_count(&conversion.pdf), conversion.report.body_pages + 1);

    let matrices = image_matrices(&conversion.pdf);
    let last = matrices.last().unwrap().as_ref().unwrap();
    // 612x792 page, 200x100 image
    assert_eq!(last, &vec![200.0, 0.0, 0.0, 100.0, 206.0, 346.0]);
}

#[test]
fn test_jpeg_and_jpg_types_are_accepted() {
    let raw = multipart_message(
        "Two photos.",
        &[
            Attachment {
                content_type: "image/jpeg",
                disposition: Some("attachment"),
                body: jpeg_bytes(40, 30),
            },
            Attachment {
                content_type: "image/jpg",
                disposition: Some("inline"),
                body: jpeg_bytes(30, 40),
            },
        ],
    );
    let conversion = eml_to_pdf(&raw, &Config::default()).unwrap();
    assert_eq!(conversion.report.image_pages, 2);
    assert_eq!(page_count(&conversion.pdf), conversion.report.body_pages + 2);
}

#[test]
fn test_unsupported_attachment_is_skipped() {
    let raw = multipart_message(
        "Archive attached.",
        &[Attachment {
            content_type: "application/zip",
            disposition: Some("attachment; filename=\"files.zip\""),
            body: b"PK\x03\x04 not much of a zip".to_vec(),
        }],
    );
    let conversion = eml_to_pdf(&raw, &Config::default()).unwrap();
    assert_eq!(conversion.report.skipped_parts, 1);
    assert_eq!(page_count(&conversion.pdf), conversion.report.body_pages);
}

#[test]
fn test_part_without_disposition_is_not_appended() {
    let raw = multipart_message(
        "Embedded image without disposition.",
        &[Attachment {
            content_type: "image/png",
            disposition: None,
            body: png_bytes(10, 10),
        }],
    );
    let conversion = eml_to_pdf(&raw, &Config::default()).unwrap();
    assert_eq!(conversion.report.image_pages, 0);
    assert_eq!(page_count(&conversion.pdf), conversion.report.body_pages);
}

#[test]
fn test_attachments_follow_encounter_order() {
    let attachment = pdf_bytes(2);
    let raw = multipart_message(
        "Mixed attachments.",
        &[
            Attachment {
                content_type: "image/png",
                disposition: Some("attachment"),
                body: png_bytes(50, 50),
            },
            Attachment {
                content_type: "application/pdf",
                disposition: Some("attachment"),
                body: attachment,
            },
        ],
    );
    let conversion = eml_to_pdf(&raw, &Config::default()).unwrap();
    let matrices = image_matrices(&conversion.pdf);
    let texts = page_texts(&conversion.pdf);
    assert_eq!(matrices.len(), 3);
    assert!(matrices[1].is_some(), "image page comes second");
    assert_eq!(texts[2][0], "attachment line 0");
}

/// A text part followed by one part whose base64 body is not base64.
fn message_with_broken_base64(content_type: &str) -> Vec<u8> {
    format!(
        "Subject: Broken\n\
         MIME-Version: 1.0\n\
         Content-Type: multipart/mixed; boundary=\"SEP\"\n\
         \n\
         --SEP\n\
         Content-Type: text/plain\n\
         \n\
         still readable\n\
         --SEP\n\
         Content-Type: {content_type}\n\
         Content-Disposition: attachment; filename=\"broken\"\n\
         Content-Transfer-Encoding: base64\n\
         \n\
         @@@@ not base64 ***\n\
         --SEP--\n"
    )
    .into_bytes()
}

#[test]
fn test_unsupported_attachment_with_broken_base64_is_skipped() {
    let raw = message_with_broken_base64("application/zip");
    let conversion = eml_to_pdf(&raw, &Config::default()).unwrap();
    assert_eq!(conversion.report.skipped_parts, 1);
    assert_eq!(page_count(&conversion.pdf), conversion.report.body_pages);
    assert!(page_texts(&conversion.pdf)[0].contains(&"still readable".to_string()));
}

#[test]
fn test_text_part_with_broken_base64_is_left_out_of_body() {
    let raw = message_with_broken_base64("text/plain");
    let conversion = eml_to_pdf(&raw, &Config::default()).unwrap();
    let texts: Vec<String> = page_texts(&conversion.pdf).into_iter().flatten().collect();
    assert!(texts.contains(&"still readable".to_string()));
    assert!(!texts.iter().any(|t| t.contains("@@@@")));
}

#[test]
fn test_pdf_attachment_with_broken_base64_is_fatal() {
    let raw = message_with_broken_base64("application/pdf");
    let err = eml_to_pdf(&raw, &Config::default()).unwrap_err();
    assert!(matches!(err, ConvertError::Mail(_)));
}

#[test]
fn test_corrupt_image_is_fatal() {
    let raw = multipart_message(
        "Broken image.",
        &[Attachment {
            content_type: "image/png",
            disposition: Some("attachment"),
            body: b"\x89PNG\r\n\x1a\n truncated".to_vec(),
        }],
    );
    let err = eml_to_pdf(&raw, &Config::default()).unwrap_err();
    assert!(matches!(err, ConvertError::Image(_)));
}

// ─── Plain text ─────────────────────────────────────────────────────

#[test]
fn test_text_lines_become_paragraphs() {
    let lines: Vec<String> = (0..120).map(|i| format!("entry {i}")).collect();
    let text = lines.join("\n");
    let conversion = txt_to_pdf(text.as_bytes(), &Config::default()).unwrap();
    assert_eq!(conversion.report.paragraphs, 120);

    let rendered: Vec<String> = page_texts(&conversion.pdf).into_iter().flatten().collect();
    assert_eq!(rendered, lines);
    assert!(conversion.report.body_pages > 1);
}

#[test]
fn test_text_rejects_invalid_utf8() {
    let err = txt_to_pdf(b"ok\n\xc3\x28", &Config::default()).unwrap_err();
    assert!(matches!(err, ConvertError::InvalidUtf8(_)));
}
