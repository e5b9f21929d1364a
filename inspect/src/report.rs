//! Text reports printed by the inspector.

use std::path::Path;

use redlilium_ingest::buffers::BufferSource;
use redlilium_ingest::{ContainerKind, GltfAsset, IngestError};

/// Top-level arrays worth counting.
const COUNTED_ARRAYS: [&str; 12] = [
    "scenes",
    "nodes",
    "meshes",
    "accessors",
    "bufferViews",
    "buffers",
    "materials",
    "textures",
    "images",
    "skins",
    "animations",
    "cameras",
];

pub fn print_summary(path: &Path, asset: &GltfAsset) {
    println!("{}", path.display());

    match asset.container_kind() {
        ContainerKind::Glb => {
            println!("  container: GLB");
            if let Some(glb) = asset.glb() {
                println!(
                    "  header:    version {}, {} bytes",
                    glb.header.version, glb.header.total_length
                );
                for chunk in std::iter::once(glb.json).chain(glb.bin) {
                    println!(
                        "  chunk:     {:<4} offset {:>10} length {:>10}",
                        chunk.kind.name(),
                        chunk.payload.position,
                        chunk.byte_length
                    );
                }
            }
        }
        ContainerKind::Json => {
            println!("  container: JSON ({} bytes)", asset.source().len());
        }
    }

    let root = asset.root();
    if let Some(version) = root.get("asset").and_then(|a| a.child_str("version")) {
        println!("  version:   {version}");
    }
    if let Some(generator) = root.get("asset").and_then(|a| a.child_str("generator")) {
        println!("  generator: {generator}");
    }

    println!("  counts:");
    for name in COUNTED_ARRAYS {
        let count = asset.count(name);
        if count > 0 {
            println!("    {name:<12} {count}");
        }
    }

    for (index, buffer) in asset.buffers().iter().enumerate() {
        let source = match buffer.source {
            BufferSource::Binary => "BIN chunk",
            BufferSource::DataUri => "data URI",
            BufferSource::External => "external",
        };
        let resolved = buffer
            .data
            .as_ref()
            .map_or_else(|| "unresolved".to_string(), |d| format!("{} bytes", d.len()));
        println!(
            "  buffer {index}: {source}, declared {} bytes, {resolved}",
            buffer.byte_length
        );
    }
}

pub fn print_json_keys(asset: &GltfAsset) {
    println!("  keys:");
    for (key, value) in asset.root().entries() {
        println!("    {key:<20} {:?} ({} children)", value.kind(), value.len());
    }
}

pub fn print_accessors(asset: &GltfAsset) {
    println!("  accessors:");
    for accessor in asset.accessors() {
        let view = accessor
            .buffer_view
            .map_or_else(|| "-".to_string(), |v| v.to_string());
        println!(
            "    #{:<4} {:<6} {:<3} x{:<8} view {:<4} offset {:<8}{}{}{}",
            accessor.index,
            accessor.accessor_type.name(),
            accessor.component_type.code(),
            accessor.count,
            view,
            accessor.byte_offset,
            if accessor.normalized { " normalized" } else { "" },
            if accessor.sparse.is_some() { " sparse" } else { "" },
            accessor
                .name
                .as_deref()
                .map_or_else(String::new, |n| format!(" '{n}'")),
        );
        if !accessor.min.is_empty() || !accessor.max.is_empty() {
            println!("          min {:?} max {:?}", accessor.min, accessor.max);
        }
    }
}

pub fn print_meshes(asset: &GltfAsset) -> Result<(), IngestError> {
    println!("  meshes:");
    for mesh in asset.decode_meshes()? {
        println!(
            "    #{} {}",
            mesh.index,
            mesh.name.as_deref().unwrap_or("<unnamed>")
        );
        for primitive in &mesh.primitives {
            println!(
                "      primitive {}: {} vertices, {} triangles, {} uv sets, {} targets{}",
                primitive.index,
                primitive.positions.len(),
                primitive.triangle_count(),
                primitive.uvs.len(),
                primitive.targets.len(),
                if primitive.draco_compressed { ", draco" } else { "" }
            );
        }
        for skipped in &mesh.skipped {
            println!("      primitive {}: skipped ({})", skipped.index, skipped.reason);
        }
    }
    Ok(())
}
