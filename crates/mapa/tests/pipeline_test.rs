//! Integration tests for the symbology pipeline
//!
//! These tests drive the public API from features to atlas and layer.

use futures::executor::block_on;

use mapa::{
    SymbologyRenderer,
    atlas::TextureAtlas,
    canvas::AtlasCanvas,
    catalogue::{CatalogueIcon, MemoryCatalogue, VectorIcon},
    color::Color,
    config::AppConfig,
    decode::{BitmapDecoder, ResvgDecoder},
    feature::{Coordinate, Feature, FieldData},
    layer::LayerStyle,
    projector::SYMBOL_CACHE_KEY_PROPERTY,
    resolve::resolve_style,
    schema::{FieldDefinition, Schema, Symbology},
    style::{IconVariant, ResolvedStyle, SymbolStyle},
};

fn colour(s: &str) -> Color {
    Color::new(s).unwrap()
}

fn catalogue() -> MemoryCatalogue {
    let tree = VectorIcon::parse(
        r#"<svg viewBox="0 0 512 512"><path class="fa-secondary" d="M0 0h512v256H0z"/><path class="fa-primary" d="M0 256h512v256H0z"/></svg>"#,
    )
    .unwrap();
    let star = VectorIcon::parse(r#"<svg viewBox="0 0 24 24"><path d="M12 2l3 7h7l-6 5 2 8-6-4-6 4 2-8-6-5h7z"/></svg>"#)
        .unwrap();

    MemoryCatalogue::new()
        .with_icon(
            "tree",
            CatalogueIcon::new("Tree").with_variant(IconVariant::Duotone, tree),
        )
        .with_icon(
            "star",
            CatalogueIcon::new("Star").with_variant(IconVariant::Solid, star),
        )
}

fn cascade_schema() -> Schema {
    let field = |id, default_value, name: &str| FieldDefinition::SymbologyBoolean {
        id,
        name: format!("Field {id}"),
        default_value,
        symbol: SymbolStyle {
            colour: Some(colour(name)),
            ..SymbolStyle::default()
        },
    };

    Schema {
        id: 1,
        name: "Cascade".to_string(),
        definition: vec![field(1, true, "red"), field(2, false, "blue")],
        symbology: Symbology::default(),
        default_symbology: None,
    }
}

fn build(renderer: &SymbologyRenderer<MemoryCatalogue>, features: &[Feature]) -> TextureAtlas {
    let projection = renderer.project(features, None, &[cascade_schema()]);
    let mut canvas = AtlasCanvas::new();
    block_on(renderer.build_atlas(&mut canvas, projection.styles())).expect("Failed to build atlas")
}

#[test]
fn test_shared_style_single_key() {
    let renderer = SymbologyRenderer::new(AppConfig::default(), catalogue());
    let features = [
        Feature::new(1, Coordinate::new(0.0, 0.0)),
        Feature::new(2, Coordinate::new(1.0, 1.0)),
    ];

    let projection = renderer.project(&features, None, &[]);

    assert_eq!(projection.styles().len(), 1);
    let projected = projection.collection().features();
    assert_eq!(
        projected[0].properties()[SYMBOL_CACHE_KEY_PROPERTY],
        projected[1].properties()[SYMBOL_CACHE_KEY_PROPERTY]
    );
}

#[test]
fn test_field_override_cascade() {
    let schema = cascade_schema();

    let untouched = Feature::new(1, Coordinate::new(0.0, 0.0)).with_schema(1);
    let overridden = Feature::new(2, Coordinate::new(0.0, 0.0))
        .with_schema(1)
        .with_value(2, FieldData::Bool(true));

    let style = resolve_style(&untouched, None, Some(&schema));
    assert_eq!(style.primary_colour(), colour("red"));

    let style = resolve_style(&overridden, None, Some(&schema));
    assert_eq!(style.primary_colour(), colour("blue"));
}

#[test]
fn test_dangling_schema_uses_map_default() {
    let renderer = SymbologyRenderer::new(AppConfig::default(), catalogue());
    let map_default = SymbolStyle {
        icon: Some("star".to_string()),
        icon_style: Some(IconVariant::Solid),
        ..SymbolStyle::default()
    };
    let feature = Feature::new(1, Coordinate::new(0.0, 0.0)).with_schema(9999);

    let projection = renderer.project(std::slice::from_ref(&feature), Some(&map_default), &[]);

    assert_eq!(projection.collection().len(), 1);
    let expected = resolve_style(&feature, Some(&map_default), None);
    assert_eq!(
        projection.collection().features()[0].cache_key(),
        &expected.cache_key()
    );
}

#[test]
fn test_missing_modifier_is_pixel_equivalent() {
    let catalogue = catalogue();
    let config = AppConfig::default();
    let renderer = SymbologyRenderer::new(config, catalogue);
    let rasterizer = renderer.rasterizer();

    let plain = ResolvedStyle::default().with_icon("star", IconVariant::Solid);
    let with_modifier = plain.clone().apply(&SymbolStyle {
        modifier_icon: Some("no-such-icon".to_string()),
        ..SymbolStyle::default()
    });
    assert_ne!(plain.cache_key(), with_modifier.cache_key());

    let decoder = ResvgDecoder::new();
    let plain = block_on(decoder.decode(&rasterizer.render(&plain).unwrap())).unwrap();
    let with_modifier =
        block_on(decoder.decode(&rasterizer.render(&with_modifier).unwrap())).unwrap();

    assert_eq!(plain.size(), with_modifier.size());
    assert_eq!(plain.data(), with_modifier.data());
}

#[test]
fn test_atlas_completeness() {
    let renderer = SymbologyRenderer::new(AppConfig::default(), catalogue());
    let features = [
        Feature::new(1, Coordinate::new(0.0, 0.0)),
        Feature::new(2, Coordinate::new(0.0, 0.0)).with_schema(1),
        Feature::new(3, Coordinate::new(0.0, 0.0))
            .with_schema(1)
            .with_value(2, FieldData::Bool(true)),
    ];

    let projection = renderer.project(&features, None, &[cascade_schema()]);
    let mut canvas = AtlasCanvas::new();
    let atlas = block_on(renderer.build_atlas(&mut canvas, projection.styles())).unwrap();

    let offsets = atlas.offset_expression();
    let sizes = atlas.size_expression();
    for key in projection.styles().keys() {
        assert!(atlas.entry(key).is_some(), "missing entry for {key}");
        let key = serde_json::json!(key.as_str());
        assert!(offsets.as_array().unwrap().contains(&key));
        assert!(sizes.as_array().unwrap().contains(&key));
    }
    assert!(atlas.default_entry().is_some());
}

#[test]
fn test_atlas_idempotence() {
    let renderer = SymbologyRenderer::new(AppConfig::default(), catalogue());
    let features = [
        Feature::new(1, Coordinate::new(0.0, 0.0)).with_schema(1),
        Feature::new(2, Coordinate::new(0.0, 0.0))
            .with_schema(1)
            .with_value(2, FieldData::Bool(true)),
    ];

    let first = build(&renderer, &features);
    let second = build(&renderer, &features);

    assert_eq!(first.entries(), second.entries());
    assert_eq!(first.offset_expression(), second.offset_expression());
    assert_eq!(first.size_expression(), second.size_expression());
}

#[test]
fn test_layer_falls_back_to_circles() {
    let renderer = SymbologyRenderer::new(AppConfig::default(), catalogue());
    let projection = renderer.project(&[Feature::new(1, Coordinate::new(0.0, 0.0))], None, &[]);

    let layer = renderer.layer(&projection, None).unwrap();
    assert!(matches!(layer.style(), LayerStyle::Circle(_)));

    let json = serde_json::to_value(&layer).unwrap();
    assert_eq!(json["style"]["circle-radius"], serde_json::json!(12.0));
    assert_eq!(json["source"]["type"], serde_json::json!("FeatureCollection"));
}

#[test]
fn test_layer_with_atlas_uses_sprites() {
    let renderer = SymbologyRenderer::new(AppConfig::default(), catalogue());
    let features = [Feature::new(1, Coordinate::new(0.0, 0.0))];
    let atlas = build(&renderer, &features);
    let projection = renderer.project(&features, None, &[]);

    let layer = renderer.layer(&projection, Some(&atlas)).unwrap();
    let json = serde_json::to_value(&layer).unwrap();

    assert!(
        json["style"]["icon-src"]
            .as_str()
            .unwrap()
            .starts_with("data:image/png;base64,")
    );
    assert_eq!(json["style"]["icon-scale"], serde_json::json!(0.5));
    assert_eq!(json["style"]["icon-rotate-with-view"], serde_json::json!(false));
}
