use caption_overlay_rust::caption::{
    CaptionBox, CaptionOptions, CaptionRequest, EstimatedMeasurer, FitConfig, FitResult,
    SizeBounds, StyleSpec, compose_captions, fit_caption,
};

const FLAT: FitConfig = FitConfig {
    padding_ratio: 0.0,
    line_height_ratio: 1.0,
};

fn regular_style(initial_size: f32, min_size: f32) -> StyleSpec {
    StyleSpec {
        weight: 400,
        family: "sans-serif".to_string(),
        initial_size,
        min_size,
        growth_factor: 0.2,
    }
}

fn describe(fit: &FitResult) -> String {
    let mut out = format!("size={} forced={}\n", fit.font_size, fit.forced);
    out.push_str(&fit.lines.join("\n"));
    out
}

#[test]
fn classic_caption_wraps_into_three_lines() {
    let caption_box = CaptionBox {
        center_x: 100.0,
        center_y: 50.0,
        width: 200.0,
        height: 100.0,
    };
    let fit = fit_caption(
        "One does not simply walk into Mordor",
        &caption_box,
        &regular_style(30.0, 8.0),
        &EstimatedMeasurer,
        &FLAT,
    );
    insta::assert_snapshot!(describe(&fit), @r"
    size=30 forced=false
    ONE DOES NOT
    SIMPLY WALK
    INTO MORDOR
    ");
}

#[test]
fn unbreakable_token_is_split_at_minimum_size() {
    let caption_box = CaptionBox {
        center_x: 50.0,
        center_y: 50.0,
        width: 100.0,
        height: 100.0,
    };
    let fit = fit_caption(
        &"a".repeat(25),
        &caption_box,
        &regular_style(20.0, 10.0),
        &EstimatedMeasurer,
        &FLAT,
    );
    assert_eq!(fit.attempts, 11);
    insta::assert_snapshot!(describe(&fit), @r"
    size=10 forced=true
    AAAAAAAAAAAAAAAA
    AAAAAAAAA
    ");
}

#[test]
fn layout_serializes_for_clients() {
    let options = CaptionOptions {
        family: "Impact".to_string(),
        weight: 700,
        bounds: SizeBounds::default(),
        fit: FitConfig::default(),
    };
    let request = CaptionRequest {
        upper: "top".to_string(),
        lower: String::new(),
        font_scale: 1.0,
    };
    let captions = compose_captions(&request, 400, 200, &options, &EstimatedMeasurer);
    let json = serde_json::to_value(&captions).expect("serialize");
    assert_eq!(json[0]["region"], "upper");
    assert_eq!(json[0]["box"]["center_x"], 300.0);
    assert_eq!(json[0]["lines"][0]["text"], "TOP");
    assert_eq!(json[1]["region"], "lower");
    assert_eq!(json[1]["fit"]["lines"].as_array().map(Vec::len), Some(0));
}
