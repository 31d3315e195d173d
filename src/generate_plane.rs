use cgmath::{vec2, vec3};
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PlaneVertex {
  pub position: [f32; 3],
  pub uv: [f32; 2],
}

impl PlaneVertex {
  const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2];

  pub fn desc() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
      array_stride: std::mem::size_of::<PlaneVertex>() as wgpu::BufferAddress,
      step_mode: wgpu::VertexStepMode::Vertex,
      attributes: &Self::ATTRIBUTES,
    }
  }
}

/// Flat grid of quad patches. Heights come from the displacement textures at draw time.
#[derive(Debug, Clone, PartialEq)]
pub struct WaterPlane {
  pub resolution: u32,
  pub vertices: Vec<PlaneVertex>,
  /// Four indices per patch: bottom-left, bottom-right, top-left, top-right.
  pub patch_indices: Vec<u32>,
}

pub struct WaterPlaneBuffers {
  pub vertex_buffer: wgpu::Buffer,
  pub index_buffer: wgpu::Buffer,
  pub index_count: u32,
}

/// `resolution` x `resolution` vertices, `spacing` world units apart, centred on the origin.
pub fn generate_plane(resolution: u32, spacing: f32) -> WaterPlane {
  let resolution = resolution.max(2);
  let half = (resolution / 2) as i64;
  let uv_scale = 1.0 / (resolution - 1) as f32;

  let mut vertices = Vec::with_capacity((resolution * resolution) as usize);
  for z in 0..resolution {
    for x in 0..resolution {
      let position = vec3(
        (x as i64 - half) as f32 * spacing,
        0.0,
        (z as i64 - half) as f32 * spacing,
      );
      let uv = vec2(x as f32, z as f32) * uv_scale;
      vertices.push(PlaneVertex {
        position: position.into(),
        uv: uv.into(),
      });
    }
  }

  let mut patch_indices = Vec::with_capacity(((resolution - 1) * (resolution - 1) * 4) as usize);
  for z in 0..resolution - 1 {
    for x in 0..resolution - 1 {
      let top_left = z * resolution + x;
      let top_right = top_left + 1;
      let bottom_left = (z + 1) * resolution + x;
      let bottom_right = bottom_left + 1;

      patch_indices.extend_from_slice(&[bottom_left, bottom_right, top_left, top_right]);
    }
  }

  WaterPlane {
    resolution,
    vertices,
    patch_indices,
  }
}

impl WaterPlane {
  pub fn patch_count(&self) -> usize {
    self.patch_indices.len() / 4
  }

  /// Two triangles per patch, for pipelines that draw a triangle list.
  pub fn triangle_indices(&self) -> Vec<u32> {
    self
      .patch_indices
      .chunks_exact(4)
      .flat_map(|patch| {
        let [bottom_left, bottom_right, top_left, top_right] = [patch[0], patch[1], patch[2], patch[3]];
        [top_left, bottom_left, top_right, top_right, bottom_left, bottom_right]
      })
      .collect()
  }

  pub fn upload(&self, device: &wgpu::Device) -> WaterPlaneBuffers {
    let indices = self.triangle_indices();

    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
      label: Some("Water plane vertex buffer"),
      contents: bytemuck::cast_slice(&self.vertices),
      usage: wgpu::BufferUsages::VERTEX,
    });

    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
      label: Some("Water plane index buffer"),
      contents: bytemuck::cast_slice(&indices),
      usage: wgpu::BufferUsages::INDEX,
    });

    WaterPlaneBuffers {
      vertex_buffer,
      index_buffer,
      index_count: indices.len() as u32,
    }
  }
}
