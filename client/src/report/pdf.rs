use super::ReportError;
use super::document::{ImageSlot, ReportDocument, Section};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, dictionary};

// A4, laid out in millimetres from the top-left like a printed page.
const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 20.0;
const IMAGE_MM: f32 = 50.0;
const IMAGE_SPACING_MM: f32 = 10.0;
const FOOTER_OFFSET_MM: f32 = 10.0;
const DISCLAIMER_WRAP: usize = 110;
const PT_PER_MM: f32 = 72.0 / 25.4;

const ROSE: (u8, u8, u8) = (225, 29, 72);
const BLACK: (u8, u8, u8) = (0, 0, 0);
const GREY: (u8, u8, u8) = (100, 100, 100);
const LIGHT_GREY: (u8, u8, u8) = (150, 150, 150);

struct PageWriter {
    operations: Vec<Operation>,
}

impl PageWriter {
    fn new() -> Self {
        Self {
            operations: Vec::new(),
        }
    }

    fn text(&mut self, x_mm: f32, y_mm: f32, size: f32, color: (u8, u8, u8), text: &str) {
        let (r, g, b) = color;
        self.operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), size.into()]),
            Operation::new(
                "rg",
                vec![
                    (r as f32 / 255.0).into(),
                    (g as f32 / 255.0).into(),
                    (b as f32 / 255.0).into(),
                ],
            ),
            Operation::new("Td", vec![mm(x_mm), mm(PAGE_HEIGHT_MM - y_mm)]),
            Operation::new("Tj", vec![literal(text)]),
            Operation::new("ET", vec![]),
        ]);
    }

    // Places an image XObject with its top-left corner at (x, y).
    fn image(&mut self, name: &str, x_mm: f32, y_mm: f32, w_mm: f32, h_mm: f32) {
        self.operations.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    mm(w_mm),
                    0.into(),
                    0.into(),
                    mm(h_mm),
                    mm(x_mm),
                    mm(PAGE_HEIGHT_MM - y_mm - h_mm),
                ],
            ),
            Operation::new("Do", vec![Object::Name(name.as_bytes().to_vec())]),
            Operation::new("Q", vec![]),
        ]);
    }
}

fn mm(value: f32) -> Object {
    (value * PT_PER_MM).into()
}

// Standard fonts only cover WinAnsi; anything else is replaced.
fn literal(text: &str) -> Object {
    let ascii: String = text
        .chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '?' })
        .collect();
    Object::string_literal(ascii)
}

fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        if !line.is_empty() && line.len() + 1 + word.len() > width {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

fn caption_x(slot_x: f32, caption: &str) -> f32 {
    let approx_width = caption.len() as f32 * 1.8;
    slot_x + ((IMAGE_MM - approx_width) / 2.0).max(0.0)
}

fn layout(report: &ReportDocument, doc: &mut Document, xobjects: &mut Dictionary) -> Vec<Operation> {
    let mut page = PageWriter::new();
    let mut y = MARGIN_MM;

    for section in &report.sections {
        match section {
            Section::Header { title } => {
                page.text(MARGIN_MM, y, 22.0, ROSE, title);
                y += 10.0;
            }
            Section::Metadata {
                generated_at,
                fingerprint,
            } => {
                page.text(MARGIN_MM, y, 10.0, GREY, &format!("Date: {}", generated_at));
                if let Some(fingerprint) = fingerprint {
                    y += 5.0;
                    page.text(MARGIN_MM, y, 8.0, GREY, &format!("Image SHA-256: {}", fingerprint));
                }
                y += 15.0;
            }
            Section::Diagnosis { label, confidence } => {
                page.text(MARGIN_MM, y, 14.0, BLACK, "Diagnosis Results");
                y += 8.0;
                page.text(MARGIN_MM, y, 12.0, BLACK, &format!("Prediction: {}", label));
                y += 6.0;
                page.text(MARGIN_MM, y, 12.0, BLACK, &format!("Confidence: {}", confidence));
                y += 10.0;
            }
            Section::Probabilities { rows } => {
                page.text(MARGIN_MM, y, 12.0, BLACK, "Detailed Probabilities:");
                y += 6.0;
                for (label, value) in rows {
                    page.text(MARGIN_MM + 5.0, y, 10.0, BLACK, &format!("- {}: {}", label, value));
                    y += 5.0;
                }
                y += 10.0;
            }
            Section::Images { slots } => {
                page.text(MARGIN_MM, y, 14.0, BLACK, "Visual Explanations");
                y += 10.0;
                let mut x = MARGIN_MM;
                for (index, slot) in slots.iter().enumerate() {
                    match slot {
                        ImageSlot::Embedded { image, .. } => {
                            let name = format!("Im{}", index);
                            let stream = Stream::new(
                                dictionary! {
                                    "Type" => "XObject",
                                    "Subtype" => "Image",
                                    "Width" => image.width as i64,
                                    "Height" => image.height as i64,
                                    "ColorSpace" => "DeviceRGB",
                                    "BitsPerComponent" => 8,
                                    "Filter" => "DCTDecode",
                                },
                                image.jpeg.clone(),
                            )
                            .with_compression(false);
                            let image_id = doc.add_object(stream);
                            xobjects.set(name.clone(), image_id);
                            page.image(&name, x, y, IMAGE_MM, IMAGE_MM);
                        }
                        ImageSlot::Placeholder { notice, .. } => {
                            page.text(x, y + IMAGE_MM / 2.0, 8.0, LIGHT_GREY, notice);
                        }
                    }
                    let caption = slot.caption();
                    page.text(caption_x(x, caption), y + IMAGE_MM + 5.0, 10.0, BLACK, caption);
                    x += IMAGE_MM + IMAGE_SPACING_MM;
                }
                y += IMAGE_MM + 10.0;
            }
            Section::Disclaimer { text } => {
                let lines = wrap(text, DISCLAIMER_WRAP);
                let bottom = PAGE_HEIGHT_MM - FOOTER_OFFSET_MM;
                let count = lines.len();
                for (index, line) in lines.iter().enumerate() {
                    let line_y = bottom - (count - 1 - index) as f32 * 3.5;
                    page.text(MARGIN_MM, line_y, 8.0, LIGHT_GREY, line);
                }
            }
        }
    }

    page.operations
}

pub fn render_pdf(report: &ReportDocument) -> Result<Vec<u8>, ReportError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    let mut xobjects = Dictionary::new();
    let operations = layout(report, &mut doc, &mut xobjects);
    let content = Content { operations }
        .encode()
        .map_err(|err| ReportError::Pdf(err.to_string()))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, content));

    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
        "XObject" => xobjects,
    });
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "MediaBox" => vec![0.into(), 0.into(), mm(PAGE_WIDTH_MM), mm(PAGE_HEIGHT_MM)],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let title = report
        .sections
        .iter()
        .find_map(|section| match section {
            Section::Header { title } => Some(title.as_str()),
            _ => None,
        })
        .unwrap_or_default();
    let info_id = doc.add_object(dictionary! {
        "Title" => literal(title),
        "Producer" => literal("client"),
    });
    doc.trailer.set("Info", info_id);

    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|err| ReportError::Pdf(err.to_string()))?;
    Ok(bytes)
}
