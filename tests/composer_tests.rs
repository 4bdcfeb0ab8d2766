use hagaki_labels::config::LayoutConfig;
use hagaki_labels::hagaki::{compose, validate, NormalizedRecord, HONORIFIC};
use hagaki_labels::render::{DrawText, Orientation, PageBuffer};
use hagaki_labels::source::RecipientRecord;

fn normalized(name: &str, postal_code: &str, prefecture: &str, address: &str) -> NormalizedRecord {
    let field = |v: &str| (!v.is_empty()).then(|| v.to_string());
    validate(&RecipientRecord {
        position: 7,
        name: field(name),
        postal_code: field(postal_code),
        prefecture: field(prefecture),
        address: field(address),
    })
    .0
}

fn composed(record: &NormalizedRecord, layout: &LayoutConfig) -> PageBuffer {
    let mut buffer = PageBuffer::new();
    compose(record, layout, &mut buffer).unwrap();
    buffer
}

#[test]
fn test_composition_is_idempotent() {
    let layout = LayoutConfig::default();
    let record = normalized("木邑敏章", "230-0025", "神奈川県", "横浜市鶴見区市場大和町7-1");

    assert_eq!(composed(&record, &layout), composed(&record, &layout));
}

#[test]
fn test_one_page_per_record() {
    let layout = LayoutConfig::default();
    let record = normalized("木邑敏章", "230-0025", "神奈川県", "横浜市鶴見区市場大和町7-1");
    assert_eq!(composed(&record, &layout).pages(), 1);
}

#[test]
fn test_placeholder_record_still_gets_honorific() {
    let layout = LayoutConfig::default();
    let record = normalized("", "", "", "");
    let buffer = composed(&record, &layout);

    let name: String = buffer
        .draws()
        .filter(|d| d.size_pt == layout.name.font_size_pt)
        .map(|d| d.text.as_str())
        .collect();
    assert_eq!(name, format!("氏名未記入{}", HONORIFIC));
}

#[test]
fn test_blocks_drawn_in_order() {
    let layout = LayoutConfig::default();
    let record = normalized("山田", "100-0001", "東京都", "千代田区");
    let buffer = composed(&record, &layout);
    let draws: Vec<&DrawText> = buffer.draws().collect();

    assert_eq!(draws[0].orientation, Orientation::Horizontal);
    let sizes: Vec<f64> = draws.iter().map(|d| d.size_pt).collect();
    let first_name = sizes
        .iter()
        .position(|s| *s == layout.name.font_size_pt)
        .unwrap();
    assert!(sizes[1..first_name]
        .iter()
        .all(|s| *s == layout.address.font_size_pt));
    assert!(sizes[first_name..]
        .iter()
        .all(|s| *s == layout.name.font_size_pt));
}

#[test]
fn test_vertical_draws_stay_on_the_card() {
    let layout = LayoutConfig::default();
    let record = normalized("長谷川 真理子", "530-0001", "大阪府", "大阪市北区梅田三丁目一番三号 ノースゲートビル");
    for draw in composed(&record, &layout).draws() {
        assert!(draw.x_mm >= 0.0 && draw.x_mm < layout.page_width_mm, "{:?}", draw);
        assert!(draw.y_mm >= 0.0 && draw.y_mm < layout.page_height_mm, "{:?}", draw);
    }
}

#[test]
fn test_digit_pairs_drawn_upright() {
    let layout = LayoutConfig::default();
    let record = normalized("a", "100-0001", "", "港区芝公園4丁目2-8");
    let upright: Vec<String> = composed(&record, &layout)
        .draws()
        .filter(|d| d.orientation == Orientation::Upright)
        .map(|d| d.text.clone())
        .collect();
    assert_eq!(upright, vec!["4", "2", "｜", "8", "a"]);
}
