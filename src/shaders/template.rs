//! Uniform injection: wraps gallery sources into complete GLSL fragment shaders.

use super::{ShaderDescriptor, ShaderDialect};

/// Uniform block and helpers shared by both dialects.
///
/// Layout must match `rendering::Uniforms` (std140).
const HEADER: &str = r#"#version 450

layout(set = 0, binding = 0) uniform VibeUniforms {
    vec2 u_resolution;
    float u_time;
    float u_low;
    float u_mid;
    float u_high;
    float u_hue_shift;
    float u_saturation;
    float u_brightness;
    float u_contrast;
    vec4 u_wave[32];
};

layout(location = 0) out vec4 v_out_color;

float waveAt(float x) {
    int i = int(clamp(x, 0.0, 1.0) * 127.0);
    return u_wave[i / 4][i % 4];
}

vec3 rgb2hsv(vec3 c) {
    vec4 K = vec4(0.0, -1.0 / 3.0, 2.0 / 3.0, -1.0);
    vec4 p = mix(vec4(c.bg, K.wz), vec4(c.gb, K.xy), step(c.b, c.g));
    vec4 q = mix(vec4(p.xyw, c.r), vec4(c.r, p.yzx), step(p.x, c.r));
    float d = q.x - min(q.w, q.y);
    float e = 1.0e-10;
    return vec3(abs(q.z + (q.w - q.y) / (6.0 * d + e)), d / (q.x + e), q.x);
}

vec3 hsv2rgb(vec3 c) {
    vec4 K = vec4(1.0, 2.0 / 3.0, 1.0 / 3.0, 3.0);
    vec3 p = abs(fract(c.xxx + K.xyz) * 6.0 - K.www);
    return c.z * mix(K.xxx, clamp(p - K.xxx, 0.0, 1.0), c.y);
}

vec3 adjustColor(vec3 color) {
    vec3 hsv = rgb2hsv(clamp(color, 0.0, 1.0));
    hsv.x = fract(hsv.x + u_hue_shift);
    hsv.y = clamp(hsv.y * u_saturation, 0.0, 1.0);
    vec3 c = hsv2rgb(hsv);
    c = (c - 0.5) * u_contrast + 0.5;
    return clamp(c * u_brightness, 0.0, 1.0);
}
"#;

/// Raw dialect writes `fragColor` directly
const RAW_PRELUDE: &str = "#define fragColor v_out_color\n";

/// ShaderToy names for the injected uniforms
const SHADERTOY_PRELUDE: &str = r#"#define iTime u_time
#define iResolution vec3(u_resolution, 1.0)
"#;

/// Entry point calling `mainImage` with a bottom-left origin
const SHADERTOY_MAIN: &str = r#"
void main() {
    vec2 coord = vec2(gl_FragCoord.x, u_resolution.y - gl_FragCoord.y);
    vec4 color = vec4(0.0, 0.0, 0.0, 1.0);
    mainImage(color, coord);
    v_out_color = vec4(adjustColor(color.rgb), 1.0);
}
"#;

/// Build the complete fragment shader for a descriptor
pub fn assemble(descriptor: &ShaderDescriptor) -> String {
    let body = strip_version(&descriptor.source);
    let mut out = String::with_capacity(HEADER.len() + body.len() + 512);
    out.push_str(HEADER);
    match descriptor.dialect {
        ShaderDialect::Raw => {
            out.push_str(RAW_PRELUDE);
            out.push_str(body);
        }
        ShaderDialect::ShaderToy => {
            out.push_str(SHADERTOY_PRELUDE);
            out.push_str(body);
            out.push_str(SHADERTOY_MAIN);
        }
    }
    out
}

/// Drop a leading `#version` line; the header supplies its own
fn strip_version(source: &str) -> &str {
    let trimmed = source.trim_start();
    if trimmed.starts_with("#version") {
        match trimmed.find('\n') {
            Some(idx) => &trimmed[idx + 1..],
            None => "",
        }
    } else {
        source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(dialect: ShaderDialect, source: &str) -> ShaderDescriptor {
        ShaderDescriptor::new("test", dialect, source)
    }

    #[test]
    fn test_header_declares_uniforms_once() {
        let code = assemble(&descriptor(ShaderDialect::Raw, "void main() {}"));
        assert!(code.starts_with("#version 450"));
        assert_eq!(code.matches("#version").count(), 1);
        for name in ["u_time", "u_resolution", "u_low", "u_mid", "u_high", "u_wave"] {
            assert!(code.contains(name), "missing {}", name);
        }
    }

    #[test]
    fn test_raw_dialect_aliases_output() {
        let code = assemble(&descriptor(ShaderDialect::Raw, "void main() { fragColor = vec4(1.0); }"));
        assert!(code.contains("#define fragColor v_out_color"));
        assert!(!code.contains("mainImage"));
    }

    #[test]
    fn test_shadertoy_dialect_gets_entry_point() {
        let source = "void mainImage(out vec4 fragColor, in vec2 fragCoord) { fragColor = vec4(iTime); }";
        let code = assemble(&descriptor(ShaderDialect::ShaderToy, source));
        assert!(code.contains("#define iTime u_time"));
        assert!(code.contains("mainImage(color, coord);"));
        assert!(!code.contains("#define fragColor"));
        // Entry point comes after the user body
        assert!(code.find("void mainImage").unwrap() < code.find("void main()").unwrap());
    }

    #[test]
    fn test_user_version_line_is_replaced() {
        let code = assemble(&descriptor(
            ShaderDialect::Raw,
            "#version 300 es\nvoid main() { fragColor = vec4(0.0); }",
        ));
        assert_eq!(code.matches("#version").count(), 1);
        assert!(!code.contains("300 es"));
    }
}
