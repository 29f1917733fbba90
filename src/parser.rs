use crate::math::{mul, parse_vector, Vec3};
use crate::types::{LightFalloff, LightType};
use log::debug;
use vmf_forge::prelude::*;

/// Brightness used when `_light` carries only a color.
const DEFAULT_BRIGHTNESS: f32 = 200.0;
const LIGHT_GAMMA: f32 = 2.2;
const DEFAULT_INNER_CONE: f32 = 10.0;

/// A light entity as read from the map, before leaf assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLight {
    /// Entity index
    pub id: u32,
    pub light_type: LightType,
    /// World units
    pub pos: Vec3,
    pub direction: Vec3,
    pub color: Vec3,
    pub falloff: LightFalloff,
}

/// Classification precedence: environment -> spot -> any other light.
pub fn light_type_from_classname(classname: &str) -> Option<LightType> {
    if classname.starts_with("light_environment") {
        Some(LightType::Directional)
    } else if classname.starts_with("light_spot") {
        Some(LightType::Spot)
    } else if classname.starts_with("light") {
        Some(LightType::Point)
    } else {
        None
    }
}

pub fn extract_lights(entities: &[Entity], unit_scale: f32) -> Vec<ParsedLight> {
    let mut lights = Vec::new();

    for (idx, ent) in entities.iter().enumerate() {
        let classname = ent.classname().unwrap_or("");
        let Some(mut light_type) = light_type_from_classname(classname) else {
            continue;
        };

        let origin = parse_vector(ent.get("origin").map(|v| v.as_str()).unwrap_or("0 0 0"));
        let pos = mul(origin, unit_scale);
        let color = parse_light_color(ent.get("_light").map(|v| v.as_str()).unwrap_or("255 255 255 200"));

        let mut direction = [0.0; 3];
        if matches!(light_type, LightType::Directional | LightType::Spot) {
            direction = angles_to_dir(
                ent.get("angles").map(|s| s.as_str()).unwrap_or("0 0 0"),
                float_for_key(ent, "pitch"),
            );
            if light_type == LightType::Directional {
                // Point back toward the sun
                direction = mul(direction, -1.0);
            }
        }

        let mut falloff = LightFalloff::default();
        if light_type != LightType::Directional {
            falloff = read_falloff(ent);
        }

        if light_type == LightType::Spot {
            let inner = Some(float_for_key(ent, "_inner_cone"))
                .filter(|&v| v != 0.0)
                .unwrap_or(DEFAULT_INNER_CONE);
            let mut outer = float_for_key(ent, "_cone");
            if outer == 0.0 || outer < inner {
                outer = inner;
            }

            if inner == 180.0 && outer == 180.0 {
                // A full sphere is just a point light
                light_type = LightType::Point;
            } else {
                falloff.inner_cos = inner.to_radians().cos();
                falloff.outer_cos = outer.to_radians().cos();
                falloff.exponent = ent
                    .get("_exponent")
                    .and_then(|s| s.parse::<f32>().ok())
                    .unwrap_or(1.0);
            }
        }

        debug!("light #{} '{}' -> {} at {:?}", idx, classname, light_type.name(), pos);
        lights.push(ParsedLight {
            id: idx as u32,
            light_type,
            pos,
            direction,
            color,
            falloff,
        });
    }
    lights
}

fn float_for_key(ent: &Entity, key: &str) -> f32 {
    ent.get(key).and_then(|s| s.trim().parse::<f32>().ok()).unwrap_or(0.0)
}

fn read_falloff(ent: &Entity) -> LightFalloff {
    let mut falloff = LightFalloff::default();
    let fifty_percent = Some(float_for_key(ent, "_fifty_percent_distance")).filter(|&v| v > 0.1);

    if let Some(dist50) = fifty_percent {
        // 50% brightness at dist50: 1 / (1 + q * d^2)
        falloff.constant_atten = 1.0;
        falloff.quadratic_atten = 1.0 / (dist50 * dist50);
        falloff.start_fade_distance = dist50;
        falloff.end_fade_distance = Some(float_for_key(ent, "_zero_percent_distance"))
            .filter(|&v| v > dist50)
            .unwrap_or(dist50 * 2.0);
    } else {
        let mut c = float_for_key(ent, "_constant_attn");
        let l = float_for_key(ent, "_linear_attn");
        let q = float_for_key(ent, "_quadratic_attn");
        if c < 0.0001 && l < 0.0001 && q < 0.0001 { c = 1.0; }

        falloff.constant_atten = c;
        falloff.linear_atten = l;
        falloff.quadratic_atten = q;
    }

    falloff.cap_distance = float_for_key(ent, "_distance").max(0.0);
    falloff
}

/// Parses a Source "_light" string ("r g b [brightness]") into linear color.
pub fn parse_light_color(s: &str) -> Vec3 {
    let parts: Vec<f32> = s.split_whitespace().filter_map(|v| v.parse().ok()).collect();
    let (rgb, brightness) = if parts.len() >= 4 {
        ([parts[0], parts[1], parts[2]], parts[3])
    } else if parts.len() == 3 {
        ([parts[0], parts[1], parts[2]], DEFAULT_BRIGHTNESS)
    } else {
        ([255.0, 255.0, 255.0], DEFAULT_BRIGHTNESS)
    };
    rgb.map(|c| (c / 255.0).max(0.0).powf(LIGHT_GAMMA) * brightness)
}

/// Converts entity angles into a direction. Yaw comes from `angles[1]`, pitch from the
/// `pitch` key when it is non-zero, otherwise from `angles[0]`.
pub fn angles_to_dir(angles_str: &str, pitch_override: f32) -> Vec3 {
    let angles = parse_vector(angles_str);
    let yaw = angles[1];
    let pitch = if pitch_override != 0.0 { pitch_override } else { angles[0] };

    let p_rad = pitch.to_radians();
    let y_rad = yaw.to_radians();

    let x = y_rad.cos() * p_rad.cos();
    let y = y_rad.sin() * p_rad.cos();
    let z = p_rad.sin();

    let clean = |v: f32| if v.abs() < 1e-4 { 0.0 } else { v };
    [clean(x), clean(y), clean(z)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(classname: &str, id: u64, keys: &[(&str, &str)]) -> Entity {
        let mut ent = Entity::new(classname, id);
        for (k, v) in keys {
            ent.set(k.to_string(), v.to_string());
        }
        ent
    }

    #[test]
    fn classification_precedence() {
        assert_eq!(light_type_from_classname("light_environment"), Some(LightType::Directional));
        assert_eq!(light_type_from_classname("light_spot"), Some(LightType::Spot));
        assert_eq!(light_type_from_classname("light"), Some(LightType::Point));
        assert_eq!(light_type_from_classname("light_dynamic"), Some(LightType::Point));
        assert_eq!(light_type_from_classname("info_player_start"), None);
    }

    #[test]
    fn origin_is_scaled_to_world_units() {
        let ents = vec![
            entity("worldspawn", 1, &[]),
            entity("light", 2, &[("origin", "160 -32 64")]),
        ];
        let lights = extract_lights(&ents, 1.0 / 16.0);
        assert_eq!(lights.len(), 1);
        assert_eq!(lights[0].id, 1, "id is the entity index");
        assert_eq!(lights[0].pos, [10.0, -2.0, 4.0]);
    }

    #[test]
    fn spot_cone_defaults_and_clamp() {
        let ents = vec![entity("light_spot", 1, &[("_cone", "5")])];
        let light = &extract_lights(&ents, 1.0)[0];
        assert_eq!(light.light_type, LightType::Spot);
        // inner defaults to 10, outer clamped up to inner
        let ten = 10.0f32.to_radians().cos();
        assert!((light.falloff.inner_cos - ten).abs() < 1e-6);
        assert!((light.falloff.outer_cos - ten).abs() < 1e-6);
        assert_eq!(light.falloff.exponent, 1.0);
    }

    #[test]
    fn full_sphere_spot_becomes_point() {
        let ents = vec![entity("light_spot", 1, &[("_inner_cone", "180"), ("_cone", "180")])];
        let light = &extract_lights(&ents, 1.0)[0];
        assert_eq!(light.light_type, LightType::Point);
        assert_eq!(light.falloff.inner_cos, 0.0);
    }

    #[test]
    fn sun_direction_is_negated() {
        // Pitch -90 points straight down, the stored sun direction points up
        let ents = vec![entity("light_environment", 1, &[("angles", "0 0 0"), ("pitch", "-90")])];
        let light = &extract_lights(&ents, 1.0)[0];
        assert_eq!(light.light_type, LightType::Directional);
        assert_eq!(light.direction, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn spot_direction_uses_yaw_and_angles_pitch() {
        let ents = vec![entity("light_spot", 1, &[("angles", "0 90 0")])];
        let light = &extract_lights(&ents, 1.0)[0];
        assert_eq!(light.direction, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn fifty_percent_falloff() {
        let ents = vec![entity("light", 1, &[("_fifty_percent_distance", "100"), ("_distance", "512")])];
        let f = extract_lights(&ents, 1.0)[0].falloff;
        assert_eq!(f.constant_atten, 1.0);
        assert!((f.quadratic_atten - 1.0e-4).abs() < 1e-9);
        assert_eq!(f.start_fade_distance, 100.0);
        assert_eq!(f.end_fade_distance, 200.0);
        assert_eq!(f.cap_distance, 512.0);
    }

    #[test]
    fn legacy_falloff_defaults_to_constant() {
        let ents = vec![entity("light", 1, &[])];
        let f = extract_lights(&ents, 1.0)[0].falloff;
        assert_eq!((f.constant_atten, f.linear_atten, f.quadratic_atten), (1.0, 0.0, 0.0));
    }

    #[test]
    fn light_color_parsing() {
        assert_eq!(parse_light_color("255 0 0 100"), [100.0, 0.0, 0.0]);
        assert_eq!(parse_light_color("255 255 255"), [200.0, 200.0, 200.0]);
        assert_eq!(parse_light_color("garbage"), [200.0, 200.0, 200.0]);
    }
}
