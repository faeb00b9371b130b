/// WGSL shader for every mesh in the scene: metal/rough lighting with an
/// optional clearcoat lobe, unlit textured planes, and squared-exponential fog.
pub const SCENE_SHADER: &str = r#"
const PI: f32 = 3.14159265;
const MAX_LIGHTS: u32 = 8u;

struct Light {
    position: vec4<f32>,
    direction: vec4<f32>,
    color: vec4<f32>,
    params: vec4<f32>,
};

struct Frame {
    view_proj: mat4x4<f32>,
    camera_pos: vec4<f32>,
    ambient: vec4<f32>,
    fog: vec4<f32>,
    light_count: vec4<u32>,
    lights: array<Light, 8>,
};

struct Object {
    model: mat4x4<f32>,
    normal: mat4x4<f32>,
    color: vec4<f32>,
    surface: vec4<f32>,
    flags: vec4<u32>,
};

@group(0) @binding(0)
var<uniform> frame: Frame;

@group(1) @binding(0)
var<uniform> object: Object;
@group(1) @binding(1)
var base_map: texture_2d<f32>;
@group(1) @binding(2)
var base_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    let world_pos = object.model * vec4<f32>(vertex.position, 1.0);
    var out: VertexOutput;
    out.clip_position = frame.view_proj * world_pos;
    out.world_pos = world_pos.xyz;
    out.world_normal = normalize((object.normal * vec4<f32>(vertex.normal, 0.0)).xyz);
    out.uv = vertex.uv;
    return out;
}

fn distribution_ggx(n_dot_h: f32, roughness: f32) -> f32 {
    let a = roughness * roughness;
    let a2 = a * a;
    let d = n_dot_h * n_dot_h * (a2 - 1.0) + 1.0;
    return a2 / max(PI * d * d, 1e-6);
}

fn geometry_smith(n_dot_v: f32, n_dot_l: f32, roughness: f32) -> f32 {
    let k = (roughness + 1.0) * (roughness + 1.0) / 8.0;
    let gv = n_dot_v / (n_dot_v * (1.0 - k) + k);
    let gl = n_dot_l / (n_dot_l * (1.0 - k) + k);
    return gv * gl;
}

fn fresnel_schlick(cos_theta: f32, f0: vec3<f32>) -> vec3<f32> {
    return f0 + (vec3<f32>(1.0) - f0) * pow(1.0 - cos_theta, 5.0);
}

fn specular(n: vec3<f32>, v: vec3<f32>, l: vec3<f32>, f0: vec3<f32>, roughness: f32) -> vec3<f32> {
    let h = normalize(v + l);
    let n_dot_l = max(dot(n, l), 0.0);
    let n_dot_v = max(dot(n, v), 1e-4);
    let d = distribution_ggx(max(dot(n, h), 0.0), roughness);
    let g = geometry_smith(n_dot_v, n_dot_l, roughness);
    let f = fresnel_schlick(max(dot(h, v), 0.0), f0);
    return d * g * f / max(4.0 * n_dot_v * n_dot_l, 1e-4);
}

// Incoming direction toward the light and its radiance at `p`.
fn incident(light: Light, p: vec3<f32>) -> vec4<f32> {
    let kind = light.position.w;
    if kind < 1.5 {
        return vec4<f32>(-light.direction.xyz, 1.0);
    }
    let to_light = light.position.xyz - p;
    let dist = max(length(to_light), 1e-4);
    let l = to_light / dist;
    var attenuation = 1.0 / max(pow(dist, light.color.w), 0.01);
    if kind < 2.5 {
        let cos_angle = dot(-l, light.direction.xyz);
        let inner = max(light.params.x, light.direction.w + 1e-4);
        attenuation *= smoothstep(light.direction.w, inner, cos_angle);
    }
    return vec4<f32>(l, attenuation);
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    var base = object.color;
    if object.flags.y != 0u {
        base *= textureSample(base_map, base_sampler, in.uv);
    }

    var color = base.rgb;
    if object.flags.x == 0u {
        let n = normalize(in.world_normal);
        let v = normalize(frame.camera_pos.xyz - in.world_pos);
        let metalness = object.surface.x;
        let roughness = clamp(object.surface.y, 0.04, 1.0);
        let clearcoat = object.surface.z;
        let clearcoat_roughness = clamp(object.surface.w, 0.04, 1.0);
        let f0 = mix(vec3<f32>(0.04), base.rgb, metalness);
        let diffuse = base.rgb * (1.0 - metalness);

        color = diffuse * frame.ambient.rgb;
        let count = min(frame.light_count.x, MAX_LIGHTS);
        for (var i = 0u; i < count; i++) {
            let light = frame.lights[i];
            let inc = incident(light, in.world_pos);
            let l = inc.xyz;
            let n_dot_l = max(dot(n, l), 0.0);
            if n_dot_l <= 0.0 {
                continue;
            }
            let radiance = light.color.rgb * inc.w;
            let spec = specular(n, v, l, f0, roughness);
            let kd = (vec3<f32>(1.0) - fresnel_schlick(max(dot(n, v), 0.0), f0)) * diffuse / PI;
            var lit = (kd + spec) * radiance * n_dot_l * PI;
            if clearcoat > 0.0 {
                let coat = specular(n, v, l, vec3<f32>(0.04), clearcoat_roughness);
                let coat_f = fresnel_schlick(max(dot(n, v), 0.0), vec3<f32>(0.04)).x * clearcoat;
                lit = lit * (1.0 - coat_f) + coat * clearcoat * radiance * n_dot_l * PI;
            }
            color += lit;
        }
    }

    let density = frame.fog.w;
    if density > 0.0 {
        let d = density * distance(frame.camera_pos.xyz, in.world_pos);
        let fog_factor = 1.0 - exp(-d * d);
        color = mix(color, frame.fog.rgb, clamp(fog_factor, 0.0, 1.0));
    }
    return vec4<f32>(color, base.a);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shader_declares_entry_points_and_bindings() {
        assert!(SCENE_SHADER.contains("fn vs_main"));
        assert!(SCENE_SHADER.contains("fn fs_main"));
        assert!(SCENE_SHADER.contains("array<Light, 8>"));
        assert!(SCENE_SHADER.contains("@group(1) @binding(2)"));
    }

    #[test]
    fn shader_light_limit_matches_uniforms() {
        let decl = format!("MAX_LIGHTS: u32 = {}u", crate::frame::MAX_LIGHTS);
        assert!(SCENE_SHADER.contains(&decl));
    }
}
