use std::ops::Range;
use std::sync::mpsc;

use crate::ocean::error::ResourceError;

/// Host copy of a range of layers of one mip level of a float texture.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureLayers {
  pub width: u32,
  pub height: u32,
  /// `f32` components per texel.
  pub components: u32,
  pub layers: Range<u32>,
  /// Tightly packed texels, layer after layer, row-major.
  pub data: Vec<f32>,
}

impl TextureLayers {
  pub fn layer(&self, layer: u32) -> &[f32] {
    debug_assert!(
      self.layers.contains(&layer),
      "layer {} was not read back, only {:?}",
      layer,
      self.layers
    );
    let len = (self.width * self.height * self.components) as usize;
    let start = (layer - self.layers.start) as usize * len;
    &self.data[start..start + len]
  }

  pub fn texel(&self, layer: u32, x: u32, y: u32) -> &[f32] {
    let components = self.components as usize;
    let start = (y * self.width + x) as usize * components;
    &self.layer(layer)[start..start + components]
  }
}

/// Copies `layers` of `texture` at `mip_level` into host memory and waits for it.
///
/// Rows are padded to `COPY_BYTES_PER_ROW_ALIGNMENT` on the GPU side and repacked here.
pub fn read_texture_layers(
  device: &wgpu::Device,
  queue: &wgpu::Queue,
  texture: &wgpu::Texture,
  mip_level: u32,
  layers: Range<u32>,
) -> Result<TextureLayers, ResourceError> {
  let texel_size = texture
    .format()
    .block_copy_size(None)
    .ok_or_else(|| ResourceError::Validation(format!("{:?} cannot be copied", texture.format())))?;
  let components = texel_size / 4;

  let width = (texture.width() >> mip_level).max(1);
  let height = (texture.height() >> mip_level).max(1);
  let layer_count = layers.end - layers.start;

  let unpadded_bytes_per_row = width * texel_size;
  let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
  let padded_bytes_per_row = (unpadded_bytes_per_row + align - 1) / align * align;

  let buffer = device.create_buffer(&wgpu::BufferDescriptor {
    label: Some("Texture readback buffer"),
    size: (padded_bytes_per_row * height * layer_count) as u64,
    usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
    mapped_at_creation: false,
  });

  let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
    label: Some("Texture readback encoder"),
  });

  encoder.copy_texture_to_buffer(
    wgpu::ImageCopyTexture {
      texture,
      mip_level,
      origin: wgpu::Origin3d {
        x: 0,
        y: 0,
        z: layers.start,
      },
      aspect: wgpu::TextureAspect::All,
    },
    wgpu::ImageCopyBuffer {
      buffer: &buffer,
      layout: wgpu::ImageDataLayout {
        offset: 0,
        bytes_per_row: Some(padded_bytes_per_row),
        rows_per_image: Some(height),
      },
    },
    wgpu::Extent3d {
      width,
      height,
      depth_or_array_layers: layer_count,
    },
  );

  queue.submit(Some(encoder.finish()));

  let buffer_slice = buffer.slice(..);
  let (sender, receiver) = mpsc::channel();
  buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
    let _ = sender.send(result);
  });
  device.poll(wgpu::Maintain::Wait);
  receiver
    .recv()
    .map_err(|_| ResourceError::ReadbackAbandoned)??;

  let mut data = Vec::with_capacity((width * height * components * layer_count) as usize);
  {
    let mapped = buffer_slice.get_mapped_range();
    for row in 0..(height * layer_count) {
      let offset = (row * padded_bytes_per_row) as usize;
      let bytes = &mapped[offset..offset + unpadded_bytes_per_row as usize];
      data.extend(
        bytes
          .chunks_exact(4)
          .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]])),
      );
    }
  }
  buffer.unmap();

  Ok(TextureLayers {
    width,
    height,
    components,
    layers,
    data,
  })
}
