use image::{Rgba, RgbaImage};

use crate::model::TextureKind;

pub const TEXTURE_SIZE: u32 = 256;

/// Integer hash noise in [0, 1)
fn hash_noise(x: u32, y: u32, seed: u32) -> f32 {
    let mut h = x.wrapping_mul(374_761_393) ^ y.wrapping_mul(668_265_263) ^ seed.wrapping_mul(2_246_822_519);
    h = (h ^ (h >> 13)).wrapping_mul(1_274_126_177);
    h ^= h >> 16;
    (h & 0x00ff_ffff) as f32 / 16_777_216.0
}

/// Bilinear value noise over a lattice of `cell` pixels, tiling at `TEXTURE_SIZE`
fn value_noise(x: u32, y: u32, cell: u32, seed: u32) -> f32 {
    let cells = (TEXTURE_SIZE / cell).max(1);
    let (cx, cy) = (x / cell, y / cell);
    let fx = (x % cell) as f32 / cell as f32;
    let fy = (y % cell) as f32 / cell as f32;
    let corner = |i: u32, j: u32| hash_noise((cx + i) % cells, (cy + j) % cells, seed);
    let top = corner(0, 0) * (1.0 - fx) + corner(1, 0) * fx;
    let bottom = corner(0, 1) * (1.0 - fx) + corner(1, 1) * fx;
    top * (1.0 - fy) + bottom * fy
}

fn shade(base: [f32; 3], factor: f32) -> Rgba<u8> {
    let channel = |c: f32| ((c * factor).clamp(0.0, 1.0) * 255.0).round() as u8;
    Rgba([channel(base[0]), channel(base[1]), channel(base[2]), 255])
}

fn metal(x: u32, y: u32) -> Rgba<u8> {
    // horizontal brushing plus a few darker scratches
    let streak = value_noise(x, y, 2, 11) * 0.15 + value_noise(x, y / 16, 1, 12) * 0.1;
    let scratch = if hash_noise(x / 3, y, 13) > 0.985 { -0.12 } else { 0.0 };
    shade([0.72, 0.74, 0.78], 0.85 + streak + scratch)
}

fn wood(x: u32, y: u32) -> Rgba<u8> {
    let wobble = value_noise(x, y, 32, 21) * 6.0;
    let rings = ((y as f32 + wobble) / TEXTURE_SIZE as f32 * std::f32::consts::TAU * 8.0).sin() * 0.5 + 0.5;
    let grain = value_noise(x, y, 4, 22) * 0.12;
    shade([0.62, 0.42, 0.24], 0.7 + rings * 0.25 + grain)
}

fn plaster(x: u32, y: u32) -> Rgba<u8> {
    let coarse = value_noise(x, y, 32, 31) * 0.08;
    let fine = value_noise(x, y, 4, 32) * 0.08 + hash_noise(x, y, 33) * 0.04;
    shade([0.9, 0.88, 0.84], 0.86 + coarse + fine)
}

fn grid(x: u32, y: u32) -> Rgba<u8> {
    let minor = TEXTURE_SIZE / 8;
    let on_major = x < 3 || y < 3;
    let on_minor = x % minor == 0 || y % minor == 0;
    match (on_major, on_minor) {
        (true, _) => shade([0.85, 0.85, 0.88], 1.0),
        (false, true) => shade([0.5, 0.5, 0.55], 1.0),
        _ => shade([0.18, 0.19, 0.22], 0.95 + hash_noise(x, y, 41) * 0.05),
    }
}

/// Generates the seamless sRGB image for a material
pub fn generate(kind: TextureKind) -> RgbaImage {
    let pixel: fn(u32, u32) -> Rgba<u8> = match kind {
        TextureKind::Metal => metal,
        TextureKind::Wood => wood,
        TextureKind::Plaster => plaster,
        TextureKind::Grid => grid,
    };
    RgbaImage::from_fn(TEXTURE_SIZE, TEXTURE_SIZE, pixel)
}

pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

pub fn upload(device: &wgpu::Device, queue: &wgpu::Queue, kind: TextureKind) -> GpuTexture {
    let image = generate(kind);
    let (width, height) = image.dimensions();
    let size = wgpu::Extent3d { width, height, depth_or_array_layers: 1 };

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(&format!("{kind:?}_texture")),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        image.as_raw(),
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        size,
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    GpuTexture { texture, view }
}

/// Repeat wrapping on both axes so UV repeat/offset tile the image
pub fn create_repeat_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("repeat_sampler"),
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn textures_are_opaque_and_sized() {
        for kind in [TextureKind::Metal, TextureKind::Wood, TextureKind::Plaster, TextureKind::Grid] {
            let image = generate(kind);
            assert_eq!(image.dimensions(), (TEXTURE_SIZE, TEXTURE_SIZE));
            assert!(image.pixels().all(|p| p.0[3] == 255));
        }
    }

    #[test]
    fn generation_is_deterministic() {
        assert_eq!(generate(TextureKind::Wood), generate(TextureKind::Wood));
        assert_ne!(generate(TextureKind::Metal), generate(TextureKind::Plaster));
    }

    #[test]
    fn noise_tiles_across_the_edge() {
        // the lattice wraps, so one period further along samples the same value
        for y in [0, 17, 128] {
            assert_eq!(value_noise(0, y, 32, 5), value_noise(TEXTURE_SIZE, y, 32, 5));
        }
        assert!((0.0..1.0).contains(&hash_noise(3, 9, 1)));
    }

    #[test]
    fn grid_has_lines_on_the_border() {
        let image = generate(TextureKind::Grid);
        assert!(image.get_pixel(0, 100).0[0] > image.get_pixel(10, 100).0[0]);
    }
}
