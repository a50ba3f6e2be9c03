use std::borrow::Cow;

use wgpu::naga::ShaderStage;

/// Compiles the pass-through quad vertex shader.
pub(crate) fn compile_vertex_shader(device: &wgpu::Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("quad vertex"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(VERTEX_SHADER_GLSL),
            stage: ShaderStage::Vertex,
            defines: &[],
        },
    })
}

/// Compiles the procedural solar wind fragment shader.
pub(crate) fn compile_fragment_shader(device: &wgpu::Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("solar wind fragment"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(FRAGMENT_SHADER_GLSL),
            stage: ShaderStage::Fragment,
            defines: &[],
        },
    })
}

/// Forwards clip-space quad corners untouched.
const VERTEX_SHADER_GLSL: &str = r"#version 450
layout(location = 0) in vec2 a_position;

void main() {
    gl_Position = vec4(a_position, 0.0, 1.0);
}
";

/// Value-noise field blended towards a slow sine wave by the control value.
///
/// The uniform block layout must match `FrameUniforms` on the host side.
/// `motion` packs (noise scale, drift speed, wave speed, unused).
const FRAGMENT_SHADER_GLSL: &str = r"#version 450
layout(location = 0) out vec4 out_color;

layout(std140, set = 0, binding = 0) uniform FrameParams {
    vec2 resolution;
    float time;
    float energy;
    vec4 base_color;
    vec4 glow_color;
    vec4 motion;
} params;

float hash(vec2 p) {
    return fract(sin(dot(p, vec2(127.1, 311.7))) * 43758.5453123);
}

float value_noise(vec2 p) {
    vec2 i = floor(p);
    vec2 f = fract(p);

    float a = hash(i);
    float b = hash(i + vec2(1.0, 0.0));
    float c = hash(i + vec2(0.0, 1.0));
    float d = hash(i + vec2(1.0, 1.0));

    vec2 u = f * f * (vec2(3.0) - 2.0 * f);

    return mix(a, b, u.x) + (c - a) * u.y * (1.0 - u.x) + (d - b) * u.x * u.y;
}

void main() {
    // Bottom-left origin.
    vec2 frag_coord = vec2(gl_FragCoord.x, params.resolution.y - gl_FragCoord.y);
    vec2 uv = frag_coord / params.resolution - vec2(0.5);
    uv = vec2(uv.x * params.resolution.x / params.resolution.y, uv.y);

    float t = params.time * params.motion.y;
    float n = value_noise(uv * params.motion.x + vec2(t));

    float wave = sin(params.time * params.motion.z) * 0.5 + 0.5;
    float intensity = mix(n, wave, params.energy);

    vec3 color = mix(params.base_color.rgb, params.glow_color.rgb, vec3(intensity));
    out_color = vec4(color, 1.0);
}
";
