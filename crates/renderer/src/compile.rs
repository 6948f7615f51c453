use std::borrow::Cow;

use wgpu::naga::ShaderStage;

/// Which of the built-in programs a module belongs to; used for labels and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ShaderKind {
    PointVertex,
    PointFragment,
    BlitVertex,
    BlitFragment,
}

impl ShaderKind {
    pub(crate) fn label(self) -> &'static str {
        match self {
            ShaderKind::PointVertex => "point sprite vertex",
            ShaderKind::PointFragment => "point sprite fragment",
            ShaderKind::BlitVertex => "accumulation blit vertex",
            ShaderKind::BlitFragment => "accumulation blit fragment",
        }
    }

    pub(crate) fn stage(self) -> ShaderStage {
        match self {
            ShaderKind::PointVertex | ShaderKind::BlitVertex => ShaderStage::Vertex,
            ShaderKind::PointFragment | ShaderKind::BlitFragment => ShaderStage::Fragment,
        }
    }

    pub(crate) fn source(self) -> &'static str {
        match self {
            ShaderKind::PointVertex => POINT_VERTEX_GLSL,
            ShaderKind::PointFragment => POINT_FRAGMENT_GLSL,
            ShaderKind::BlitVertex => BLIT_VERTEX_GLSL,
            ShaderKind::BlitFragment => BLIT_FRAGMENT_GLSL,
        }
    }
}

/// Compiles one of the built-in GLSL programs through wgpu's GLSL frontend.
///
/// Compilation errors surface through the device's validation error scope,
/// which the caller checks once all modules and pipelines exist.
pub(crate) fn compile_shader(device: &wgpu::Device, kind: ShaderKind) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(kind.label()),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(kind.source()),
            stage: kind.stage(),
            defines: &[],
        },
    })
}

/// Instanced quad per point. `u_shape.xy` is the sprite half extent in clip
/// space and `u_shape.z` the trail weight.
const POINT_VERTEX_GLSL: &str = r"#version 450
layout(location = 0) in vec2 a_position;
layout(location = 1) in vec2 a_previous;
layout(location = 2) in vec4 a_color;
layout(location = 3) in uint a_id;

layout(std140, set = 0, binding = 0) uniform PointParams {
    vec4 u_shape;
    float u_sensitivity;
    float u_angle;
    vec2 u_padding;
} params;

layout(location = 0) out vec2 v_uv;
layout(location = 1) out vec4 v_color;

const vec2 corners[4] = vec2[4](
    vec2(-1.0, -1.0),
    vec2(1.0, -1.0),
    vec2(-1.0, 1.0),
    vec2(1.0, 1.0)
);

void main() {
    uint corner_index = uint(gl_VertexIndex);
    vec2 corner = corners[corner_index];

    float speed = length(a_position - a_previous);
    float settle = mix(1.0, 0.55 + 0.45 * exp(-speed * 6.0), params.u_shape.z);
    float twinkle = 0.85 + 0.15 * sin(float(a_id) * 0.618034 + params.u_angle * 6.283185);

    v_uv = vec2(corner.x * 0.5 + 0.5, 0.5 - corner.y * 0.5);
    v_color = vec4(a_color.rgb * settle, a_color.a * twinkle);
    gl_Position = vec4(a_position + corner * params.u_shape.xy, 0.0, 1.0);
}
";

const POINT_FRAGMENT_GLSL: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 1) in vec4 v_color;
layout(location = 0) out vec4 outColor;

layout(std140, set = 0, binding = 0) uniform PointParams {
    vec4 u_shape;
    float u_sensitivity;
    float u_angle;
    vec2 u_padding;
} params;

layout(set = 0, binding = 1) uniform texture2D s_texture;
layout(set = 0, binding = 2) uniform sampler s_sampler;

void main() {
    vec4 glow = texture(sampler2D(s_texture, s_sampler), v_uv);
    outColor = vec4(v_color.rgb * glow.rgb, glow.a * v_color.a * params.u_sensitivity);
}
";

/// Full-screen triangle with a top-left texture origin.
const BLIT_VERTEX_GLSL: &str = r"#version 450
layout(location = 0) out vec2 v_uv;

const vec2 positions[3] = vec2[3](
    vec2(-1.0, -3.0),
    vec2(3.0, 1.0),
    vec2(-1.0, 1.0)
);

void main() {
    uint vertex_index = uint(gl_VertexIndex);
    vec2 pos = positions[vertex_index];
    v_uv = vec2(pos.x * 0.5 + 0.5, 0.5 - pos.y * 0.5);
    gl_Position = vec4(pos, 0.0, 1.0);
}
";

const BLIT_FRAGMENT_GLSL: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 outColor;

layout(set = 0, binding = 0) uniform texture2D s_accumulation;
layout(set = 0, binding = 1) uniform sampler s_sampler;

void main() {
    vec3 color = texture(sampler2D(s_accumulation, s_sampler), v_uv).rgb;
    outColor = vec4(clamp(color, vec3(0.0), vec3(1.0)), 1.0);
}
";

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::naga::front::glsl::{Frontend, Options};
    use wgpu::naga::valid::{Capabilities, ValidationFlags, Validator};

    const ALL: [ShaderKind; 4] = [
        ShaderKind::PointVertex,
        ShaderKind::PointFragment,
        ShaderKind::BlitVertex,
        ShaderKind::BlitFragment,
    ];

    #[test]
    fn builtin_shaders_parse_and_validate() {
        for kind in ALL {
            let mut frontend = Frontend::default();
            let module = frontend
                .parse(&Options::from(kind.stage()), kind.source())
                .unwrap_or_else(|err| panic!("{} failed to parse: {err:?}", kind.label()));
            Validator::new(ValidationFlags::all(), Capabilities::all())
                .validate(&module)
                .unwrap_or_else(|err| panic!("{} failed validation: {err:?}", kind.label()));
        }
    }

    #[test]
    fn point_program_uses_expected_interface_names() {
        let vertex = ShaderKind::PointVertex.source();
        for name in ["a_position", "a_previous", "a_color", "a_id"] {
            assert!(vertex.contains(name), "missing attribute {name}");
        }
        let fragment = ShaderKind::PointFragment.source();
        assert!(fragment.contains("s_texture"));
        assert!(fragment.contains("u_sensitivity"));
    }
}
