use voxelspace_render::{Settings, TILE_SIZE};

/// Compute kernel: one invocation per pixel, same traversal and shading as
/// the CPU path. `{{NAME}}` placeholders are filled by [`raycast_shader`].
const RAYCAST_TEMPLATE: &str = r#"
struct Uniforms {
    position: vec3<f32>,
    time: f32,
    rotation: vec3<f32>,
    _padding: f32,
};

@group(0) @binding(0) var screen: texture_storage_2d<rgba8unorm, write>;
@group(1) @binding(0) var<uniform> uniforms: Uniforms;
@group(1) @binding(1) var voxels: texture_3d<u32>;

const GRID_SIZE: i32 = {{GRID_SIZE}};
const GRID_CENTER: f32 = {{GRID_CENTER}};
const CLEARANCE_RADIUS: f32 = {{CLEARANCE_RADIUS}};
const CUTOFF_RADIUS: f32 = {{CUTOFF_RADIUS}};
const NOISE_SCALE: f32 = {{NOISE_SCALE}};
const SOLID_THRESHOLD: f32 = {{SOLID_THRESHOLD}};
const VARIANT_COUNT: u32 = {{VARIANT_COUNT}}u;
const MAX_STEPS: u32 = {{MAX_STEPS}}u;
const FOCAL_LENGTH: f32 = {{FOCAL_LENGTH}};
const LIGHT_DIRECTION: vec3<f32> = vec3<f32>({{LIGHT_DIRECTION}});
const AMBIENT: f32 = {{AMBIENT}};
const DIFFUSE_WEIGHT: f32 = {{DIFFUSE_WEIGHT}};
const AO_WEIGHT: f32 = {{AO_WEIGHT}};

fn mod289(x: vec4<f32>) -> vec4<f32> { return x - floor(x * (1.0 / 289.0)) * 289.0; }
fn perm4(x: vec4<f32>) -> vec4<f32> { return mod289(((x * 34.0) + 1.0) * x); }

fn noise3(p: vec3<f32>) -> f32 {
    let a = floor(p);
    var d = p - a;
    d = d * d * (3.0 - 2.0 * d);
    let cell = clamp(a - floor(a / 289.0) * 289.0, vec3<f32>(0.0), vec3<f32>(288.0));

    let b = cell.xxyy + vec4<f32>(0.0, 1.0, 0.0, 1.0);
    let k1 = perm4(b.xyxy);
    let k2 = perm4(k1.xyxy + b.zzww);

    let c = k2 + cell.zzzz;
    let k3 = perm4(c);
    let k4 = perm4(c + 1.0);

    let o1 = fract(k3 * (1.0 / 41.0));
    let o2 = fract(k4 * (1.0 / 41.0));

    let o3 = o2 * d.z + o1 * (1.0 - d.z);
    let o4 = o3.yw * d.x + o3.xz * (1.0 - d.x);

    return o4.y * d.y + o4.x * (1.0 - d.y);
}

fn random_color(p: vec3<f32>) -> vec3<f32> {
    let r = fract(sin(dot(p, vec3<f32>(12.9898, 78.233, 45.543))) * 43758.5453);
    let g = fract(sin(dot(p, vec3<f32>(34.456, 98.765, 67.891))) * 23543.345);
    let b = fract(sin(dot(p, vec3<f32>(87.654, 21.987, 43.219))) * 87654.123);
    return vec3<f32>(r, g, b);
}

fn procedural(c: vec3<i32>) -> u32 {
    let p = vec3<f32>(c);
    let dist = length(p - vec3<f32>(GRID_CENTER));
    if (dist > CUTOFF_RADIUS || dist < CLEARANCE_RADIUS) {
        return 0u;
    }
    if (noise3(p * NOISE_SCALE) < SOLID_THRESHOLD) {
        return 0u;
    }
    return 2u + min(u32(noise3(p) * f32(VARIANT_COUNT)), VARIANT_COUNT - 1u);
}

fn get_voxel(c: vec3<i32>) -> u32 {
    if (all(c >= vec3<i32>(0)) && all(c < vec3<i32>(GRID_SIZE))) {
        return textureLoad(voxels, c, 0).r;
    }
    return procedural(c);
}

fn occupied(c: vec3<i32>) -> f32 {
    return select(0.0, 1.0, get_voxel(c) != 0u);
}

fn unit(axis: i32) -> vec3<i32> {
    var v = vec3<i32>(0);
    v[axis] = 1;
    return v;
}

fn rotate2d(v: vec2<f32>, a: f32) -> vec2<f32> {
    let s = sin(a);
    let c = cos(a);
    return vec2<f32>(v.x * c - v.y * s, v.y * c + v.x * s);
}

fn dominant_axis(d: vec3<f32>) -> i32 {
    let m = abs(d);
    if (m.x >= m.y && m.x >= m.z) {
        return 0;
    }
    if (m.y >= m.z) {
        return 1;
    }
    return 2;
}

fn vertex_ao(a: f32, b: f32, corner: f32) -> f32 {
    return 1.0 - (a + b + max(corner, a * b)) / 3.0;
}

fn voxel_ao(face: vec3<i32>, d1: vec3<i32>, d2: vec3<i32>) -> vec4<f32> {
    let side = vec4<f32>(
        occupied(face + d1),
        occupied(face + d2),
        occupied(face - d1),
        occupied(face - d2),
    );
    let corner = vec4<f32>(
        occupied(face + d1 + d2),
        occupied(face - d1 + d2),
        occupied(face - d1 - d2),
        occupied(face + d1 - d2),
    );
    return vec4<f32>(
        vertex_ao(side.x, side.y, corner.x),
        vertex_ao(side.y, side.z, corner.y),
        vertex_ao(side.z, side.w, corner.z),
        vertex_ao(side.w, side.x, corner.w),
    );
}

@compute @workgroup_size({{TILE_SIZE}}, {{TILE_SIZE}})
fn main(@builtin(global_invocation_id) pixel: vec3<u32>) {
    let res = textureDimensions(screen);
    if (pixel.x >= res.x || pixel.y >= res.y) {
        return;
    }
    let resf = vec2<f32>(res);
    let frag = vec2<f32>(f32(pixel.x) + 0.5, resf.y - f32(pixel.y) - 0.5);
    let uv = 2.0 * frag / resf - 1.0;

    var dir = vec3<f32>(uv.x, uv.y * resf.y / resf.x, FOCAL_LENGTH);
    let yz = rotate2d(dir.yz, uniforms.rotation.x);
    dir = vec3<f32>(dir.x, yz.x, yz.y);
    let xz = rotate2d(dir.xz, uniforms.rotation.y);
    dir = vec3<f32>(xz.x, dir.y, xz.y);

    let origin = uniforms.position;
    let stepf = sign(dir);
    let ray_step = vec3<i32>(stepf);
    let delta = abs(vec3<f32>(length(dir)) / dir);
    var cell = vec3<i32>(floor(origin));
    var side = vec3<f32>(1e30);
    for (var a = 0; a < 3; a++) {
        if (ray_step[a] != 0) {
            let offset = stepf[a] * (floor(origin[a]) - origin[a]) + stepf[a] * 0.5 + 0.5;
            // 0 * inf when a component is too small for its delta to be finite.
            side[a] = select(offset * delta[a], 0.0, offset == 0.0);
        }
    }

    var entered = -1;
    var block = 0u;
    for (var i = 0u; i < MAX_STEPS; i++) {
        block = get_voxel(cell);
        if (block != 0u) {
            break;
        }
        var a = 2;
        if (side.x <= side.y && side.x <= side.z) {
            a = 0;
        } else if (side.y <= side.z) {
            a = 1;
        }
        side[a] += delta[a];
        cell[a] += ray_step[a];
        entered = a;
    }

    if (block == 0u) {
        textureStore(screen, pixel.xy, vec4<f32>(0.0, 0.0, 0.0, 1.0));
        return;
    }

    var axis = entered;
    var point = origin;
    if (axis < 0) {
        axis = dominant_axis(dir);
    } else {
        let plane = f32(cell[axis]) + select(0.0, 1.0, dir[axis] < 0.0);
        point = origin + dir * ((plane - origin[axis]) / dir[axis]);
    }
    var normal = vec3<i32>(0);
    normal[axis] = select(1, -1, dir[axis] > 0.0);

    let t1 = (axis + 1) % 3;
    let t2 = (axis + 2) % 3;
    let face_uv = vec2<f32>(fract(point[t1]), fract(point[t2]));

    let ao4 = voxel_ao(cell + normal, unit(t1), unit(t2));
    let bottom = mix(ao4.z, ao4.w, face_uv.x);
    let top = mix(ao4.y, ao4.x, face_uv.x);
    let blended = max(mix(bottom, top, face_uv.y), 0.0);
    let ao = select(pow(blended, 1.0 / 3.0), 0.0, blended <= 0.0);

    let diffuse = clamp(dot(vec3<f32>(normal), LIGHT_DIRECTION), 0.0, 1.0);

    var base = vec3<f32>(1.0);
    if (block > 1u) {
        base = random_color(vec3<f32>(cell));
    }

    let light = AMBIENT + diffuse * DIFFUSE_WEIGHT + ao * AO_WEIGHT;
    let color = clamp(base * light, vec3<f32>(0.0), vec3<f32>(1.0));
    textureStore(screen, pixel.xy, vec4<f32>(color, 1.0));
}
"#;

/// Copies the ray cast target onto the surface with one full-screen triangle.
pub const PRESENT_SHADER: &str = r#"
@group(0) @binding(0) var frame: texture_2d<f32>;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> VertexOutput {
    let corner = vec2<f32>(f32((index << 1u) & 2u), f32(index & 2u));
    var out: VertexOutput;
    out.position = vec4<f32>(corner * 2.0 - 1.0, 0.0, 1.0);
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let dims = textureDimensions(frame);
    let p = min(vec2<u32>(in.position.xy), dims - vec2<u32>(1u));
    return textureLoad(frame, p, 0);
}
"#;

fn float(v: f32) -> String {
    format!("{v:?}")
}

/// WGSL source for the ray cast kernel with the field, trace and shading
/// constants of `settings` baked in.
pub fn raycast_shader(settings: &Settings, grid_size: u32) -> String {
    let light = settings.shading.light_direction.normalize_or_zero();
    let substitutions = [
        ("{{GRID_SIZE}}", grid_size.to_string()),
        ("{{GRID_CENTER}}", float(grid_size as f32 / 2.0)),
        ("{{CLEARANCE_RADIUS}}", float(settings.field.clearance_radius)),
        ("{{CUTOFF_RADIUS}}", float(settings.field.cutoff_radius)),
        ("{{NOISE_SCALE}}", float(settings.field.noise_scale)),
        ("{{SOLID_THRESHOLD}}", float(settings.field.solid_threshold)),
        ("{{VARIANT_COUNT}}", settings.field.variants().to_string()),
        ("{{MAX_STEPS}}", settings.trace.max_steps.to_string()),
        ("{{FOCAL_LENGTH}}", float(settings.camera.focal_length)),
        (
            "{{LIGHT_DIRECTION}}",
            format!("{}, {}, {}", float(light.x), float(light.y), float(light.z)),
        ),
        ("{{AMBIENT}}", float(settings.shading.ambient)),
        ("{{DIFFUSE_WEIGHT}}", float(settings.shading.diffuse_weight)),
        ("{{AO_WEIGHT}}", float(settings.shading.ao_weight)),
        ("{{TILE_SIZE}}", TILE_SIZE.to_string()),
    ];
    substitutions
        .iter()
        .fold(RAYCAST_TEMPLATE.to_string(), |src, (key, value)| src.replace(key, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_placeholder_is_filled() {
        let src = raycast_shader(&Settings::default(), 128);
        assert!(!src.contains("{{"), "unfilled placeholder");
        assert!(src.contains("const GRID_SIZE: i32 = 128;"));
        assert!(src.contains("const GRID_CENTER: f32 = 64.0;"));
        assert!(src.contains("const MAX_STEPS: u32 = 768u;"));
        assert!(src.contains("@workgroup_size(16, 16)"));
    }

    #[test]
    fn settings_flow_into_constants() {
        let mut settings = Settings::default();
        settings.field.cutoff_radius = 300.0;
        settings.trace.max_steps = 1000;
        let src = raycast_shader(&settings, 64);
        assert!(src.contains("const CUTOFF_RADIUS: f32 = 300.0;"));
        assert!(src.contains("const MAX_STEPS: u32 = 1000u;"));
        assert!(src.contains("const GRID_SIZE: i32 = 64;"));
    }

    #[test]
    fn variant_count_matches_cpu_clamp() {
        let mut settings = Settings::default();
        settings.field.variant_count = u8::MAX;
        let src = raycast_shader(&settings, 64);
        assert!(src.contains("const VARIANT_COUNT: u32 = 254u;"));
        settings.field.variant_count = 0;
        let src = raycast_shader(&settings, 64);
        assert!(src.contains("const VARIANT_COUNT: u32 = 1u;"));
    }

    #[test]
    fn side_distance_guards_zero_times_infinity() {
        let src = raycast_shader(&Settings::default(), 64);
        assert!(src.contains("select(offset * delta[a], 0.0, offset == 0.0)"));
    }

    #[test]
    fn noise_lattice_is_wrapped() {
        let src = raycast_shader(&Settings::default(), 64);
        assert!(src.contains("floor(a / 289.0) * 289.0"));
        assert!(src.contains("let c = k2 + cell.zzzz;"));
    }

    #[test]
    fn floats_always_have_a_fraction() {
        assert_eq!(float(128.0), "128.0");
        assert_eq!(float(0.05), "0.05");
    }

    #[test]
    fn present_shader_has_entry_points() {
        assert!(PRESENT_SHADER.contains("fn vs_main"));
        assert!(PRESENT_SHADER.contains("fn fs_main"));
    }
}
