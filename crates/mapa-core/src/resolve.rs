//! Symbol style resolution.
//!
//! [`resolve_style`] computes the final [`ResolvedStyle`] of one feature by
//! layering partial styles, lowest precedence first:
//!
//! 1. the built-in application defaults ([`ResolvedStyle::default`]);
//! 2. the map's default style;
//! 3. the schema's default style;
//! 4. the symbol preset the feature references, if it exists in the schema;
//! 5. every symbology field of the schema, in definition order, whose
//!    effective value is `true`.
//!
//! The effective value of a symbology field is the feature's stored boolean
//! when there is one, otherwise the field's default. Defaults therefore apply
//! to features that have never stored a value for the field.

use log::{debug, trace, warn};

use crate::{
    feature::Feature,
    schema::{FieldDefinition, Schema},
    style::{ResolvedStyle, SymbolStyle},
};

/// Resolves the final style of `feature`.
///
/// `schema` is the schema the feature references, already looked up by the
/// caller. Passing `None` (no reference, or a dangling one) resolves with the
/// application and map defaults only.
///
/// # Examples
///
/// ```
/// use mapa_core::{
///     color::Color,
///     feature::{Coordinate, Feature},
///     resolve::resolve_style,
///     style::{ResolvedStyle, SymbolStyle},
/// };
///
/// let map_default = SymbolStyle {
///     colour: Some(Color::new("#336699").unwrap()),
///     ..SymbolStyle::default()
/// };
/// let feature = Feature::new(1, Coordinate::new(0.0, 0.0));
///
/// let style = resolve_style(&feature, Some(&map_default), None);
/// assert_eq!(style, ResolvedStyle::default().apply(&map_default));
/// ```
pub fn resolve_style(
    feature: &Feature,
    map_default: Option<&SymbolStyle>,
    schema: Option<&Schema>,
) -> ResolvedStyle {
    let mut style = ResolvedStyle::default();

    if let Some(map_default) = map_default {
        style = style.apply(map_default);
    }

    let Some(schema) = schema else {
        trace!(feature_id = feature.id; "Resolved without schema");
        return style;
    };

    if let Some(schema_default) = &schema.default_symbology {
        style = style.apply(schema_default);
    }

    if let Some(symbol_id) = feature.symbol_id {
        match schema.symbology.symbol(symbol_id) {
            Some(symbol) => style = style.apply(&symbol.props),
            None => debug!(
                feature_id = feature.id,
                schema_id = schema.id,
                symbol_id;
                "Symbol reference does not resolve, skipping"
            ),
        }
    }

    for field in &schema.definition {
        if let Some(symbol) = field_override(feature, field) {
            style = style.apply(symbol);
        }
    }

    trace!(feature_id = feature.id, style:?; "Resolved style");
    style
}

/// Returns the style a field layers over the feature, if any.
fn field_override<'a>(feature: &Feature, field: &'a FieldDefinition) -> Option<&'a SymbolStyle> {
    match field {
        FieldDefinition::SymbologyBoolean {
            id,
            default_value,
            symbol,
            ..
        } => {
            let stored = feature.value_for(*id).and_then(|value| {
                let flag = value.as_bool();
                if flag.is_none() {
                    warn!(
                        feature_id = feature.id,
                        field_id = *id;
                        "Non-boolean value stored for symbology field, using default"
                    );
                }
                flag
            });
            stored.unwrap_or(*default_value).then_some(symbol)
        }
        FieldDefinition::Text { .. }
        | FieldDefinition::Number { .. }
        | FieldDefinition::Boolean { .. }
        | FieldDefinition::Date { .. }
        | FieldDefinition::Url { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        color::Color,
        feature::{Coordinate, FieldData},
        schema::{SymbolPreset, Symbology, SymbologyGroup},
        style::IconVariant,
    };

    fn colour(s: &str) -> Color {
        Color::new(s).unwrap()
    }

    fn coloured(s: &str) -> SymbolStyle {
        SymbolStyle {
            colour: Some(colour(s)),
            ..SymbolStyle::default()
        }
    }

    fn symbology_field(id: u64, default_value: bool, symbol: SymbolStyle) -> FieldDefinition {
        FieldDefinition::SymbologyBoolean {
            id,
            name: format!("field {id}"),
            default_value,
            symbol,
        }
    }

    fn schema(definition: Vec<FieldDefinition>) -> Schema {
        Schema {
            id: 1,
            name: "Test".to_string(),
            definition,
            symbology: Symbology {
                groups: vec![SymbologyGroup {
                    id: 1,
                    name: "Default".to_string(),
                }],
                symbols: vec![SymbolPreset {
                    id: 10,
                    group_id: 1,
                    props: SymbolStyle {
                        icon: Some("tree".to_string()),
                        icon_style: Some(IconVariant::Duotone),
                        colour: Some(colour("green")),
                        ..SymbolStyle::default()
                    },
                    favourited_map_ids: Vec::new(),
                }],
            },
            default_symbology: Some(SymbolStyle {
                size: Some(22.0),
                colour: Some(colour("grey")),
                ..SymbolStyle::default()
            }),
        }
    }

    fn feature() -> Feature {
        Feature::new(1, Coordinate::new(10.0, 20.0)).with_schema(1)
    }

    #[test]
    fn test_no_schema_uses_map_default_only() {
        let map_default = coloured("purple");
        let style = resolve_style(&feature(), Some(&map_default), None);
        assert_eq!(style, ResolvedStyle::default().apply(&map_default));
    }

    #[test]
    fn test_no_inputs_is_builtin_default() {
        let style = resolve_style(&Feature::new(1, Coordinate::default()), None, None);
        assert_eq!(style, ResolvedStyle::default());
    }

    #[test]
    fn test_schema_default_overrides_map_default() {
        let map_default = SymbolStyle {
            colour: Some(colour("purple")),
            rotation: Some(45.0),
            ..SymbolStyle::default()
        };
        let style = resolve_style(&feature(), Some(&map_default), Some(&schema(Vec::new())));

        assert_eq!(style.primary_colour(), colour("grey"));
        assert_eq!(style.size(), 22.0);
        assert_eq!(style.rotation(), 45.0);
    }

    #[test]
    fn test_symbol_preset_overrides_schema_default() {
        let style = resolve_style(&feature().with_symbol(10), None, Some(&schema(Vec::new())));

        assert_eq!(style.icon(), "tree");
        assert_eq!(style.icon_variant(), IconVariant::Duotone);
        assert_eq!(style.primary_colour(), colour("green"));
        assert_eq!(style.size(), 22.0);
    }

    #[test]
    fn test_missing_symbol_is_skipped() {
        let schema = schema(Vec::new());
        let with_missing = resolve_style(&feature().with_symbol(99), None, Some(&schema));
        let without = resolve_style(&feature(), None, Some(&schema));
        assert_eq!(with_missing, without);
    }

    #[test]
    fn test_field_default_true_applies_without_data() {
        let schema = schema(vec![
            symbology_field(1, true, coloured("red")),
            symbology_field(2, false, coloured("blue")),
        ]);
        let style = resolve_style(&feature(), None, Some(&schema));
        assert_eq!(style.primary_colour(), colour("red"));
    }

    #[test]
    fn test_later_field_overrides_earlier_field() {
        let schema = schema(vec![
            symbology_field(1, true, coloured("red")),
            symbology_field(2, false, coloured("blue")),
        ]);
        let feature = feature().with_value(2, FieldData::Bool(true));
        let style = resolve_style(&feature, None, Some(&schema));
        assert_eq!(style.primary_colour(), colour("blue"));
    }

    #[test]
    fn test_field_order_not_data_order_decides() {
        let schema = schema(vec![
            symbology_field(1, false, coloured("red")),
            symbology_field(2, false, coloured("blue")),
        ]);
        // Stored in reverse order; field 2 is still defined last
        let feature = feature()
            .with_value(2, FieldData::Bool(true))
            .with_value(1, FieldData::Bool(true));
        let style = resolve_style(&feature, None, Some(&schema));
        assert_eq!(style.primary_colour(), colour("blue"));
    }

    #[test]
    fn test_explicit_false_suppresses_default_true() {
        let schema = schema(vec![symbology_field(1, true, coloured("red"))]);
        let feature = feature().with_value(1, FieldData::Bool(false));
        let style = resolve_style(&feature, None, Some(&schema));
        assert_eq!(style.primary_colour(), colour("grey"));
    }

    #[test]
    fn test_non_boolean_value_falls_back_to_default() {
        let schema = schema(vec![symbology_field(1, true, coloured("red"))]);
        let feature = feature().with_value(1, FieldData::Text("yes".to_string()));
        let style = resolve_style(&feature, None, Some(&schema));
        assert_eq!(style.primary_colour(), colour("red"));
    }

    #[test]
    fn test_partial_field_style_keeps_earlier_attributes() {
        let schema = schema(vec![symbology_field(
            1,
            true,
            SymbolStyle {
                modifier_icon: Some("circle-check".to_string()),
                ..SymbolStyle::default()
            },
        )]);
        let style = resolve_style(&feature().with_symbol(10), None, Some(&schema));

        assert_eq!(style.icon(), "tree");
        assert_eq!(style.primary_colour(), colour("green"));
        assert_eq!(style.modifier_icon(), Some("circle-check"));
    }

    #[test]
    fn test_plain_boolean_fields_do_not_style() {
        let schema = schema(vec![FieldDefinition::Boolean {
            id: 1,
            name: "Edible".to_string(),
            default_value: true,
        }]);
        let feature = feature().with_value(1, FieldData::Bool(true));
        let style = resolve_style(&feature, None, Some(&schema));
        assert_eq!(style, resolve_style(&self::feature(), None, Some(&schema)));
    }
}
