use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use glam::Mat4;
use log::error;
use skinner::{animation::Animator, skin::joint_matrices};
use skinner_asset::{
    loader::{gltf::load_glb_from_path, AssetLoadParams},
    node::SceneGraph,
    scene::ModelAsset,
};

/// Print the structure of a skinned GLB model.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// GLB file to inspect
    file: PathBuf,
    /// Animation time in seconds used for the bone palette
    #[arg(short, long, default_value_t = 0.0)]
    time: f32,
    /// Print the bone matrices of the active animation at `--time`
    #[arg(short, long)]
    bones: bool,
    /// Skip decoding embedded images
    #[arg(long)]
    no_textures: bool,
    /// Log loader details
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let params = AssetLoadParams {
        load_textures: !cli.no_textures,
        ..Default::default()
    };
    let asset = match load_glb_from_path(&cli.file, &params) {
        Ok(asset) => asset,
        Err(err) => {
            error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    print_summary(&asset);
    if cli.bones {
        print_bones(asset, params.active_animation, cli.time);
    }
    ExitCode::SUCCESS
}

fn label(name: Option<&str>) -> &str {
    name.unwrap_or("<unnamed>")
}

fn print_tree(graph: &SceneGraph, index: usize, depth: usize) {
    let Some(node) = graph.node(index) else {
        return;
    };
    let joint = if node.is_joint() { " [joint]" } else { "" };
    println!("{:indent$}#{index} {}{joint}", "", label(node.name()), indent = depth * 2);
    for child in node.children() {
        print_tree(graph, *child, depth + 1);
    }
}

fn print_summary(asset: &ModelAsset) {
    println!("Nodes ({}):", asset.graph.len());
    for root in asset.graph.roots() {
        print_tree(&asset.graph, *root, 1);
    }

    match &asset.skin {
        Some(skin) => {
            println!("Skin {} ({} joints):", label(skin.name.as_deref()), skin.len());
            for (bone, name) in asset.joint_names().into_iter().enumerate() {
                println!("  bone {bone}: {}", label(name));
            }
        }
        None => println!("No skin"),
    }

    println!(
        "Meshes ({}, {} primitives):",
        asset.meshes.len(),
        asset.primitive_count()
    );
    for mesh in &asset.meshes {
        println!("  {}", label(mesh.name.as_deref()));
        for primitive in &mesh.primitives {
            let texture = primitive
                .texture
                .map_or_else(|| "none".to_string(), |image| format!("image #{image}"));
            println!(
                "    {:?}: {} vertices, {} drawn, texture {texture}",
                primitive.mode,
                primitive.vertices.len(),
                primitive.draw_count()
            );
        }
    }
    println!("Textures decoded: {}", asset.textures.len());

    println!("Animations ({}):", asset.animations.len());
    for (index, summary) in asset.animation_summaries().into_iter().enumerate() {
        println!(
            "  #{index} {}: {:.3}s, {} channels",
            label(summary.name.as_deref()),
            summary.duration,
            summary.channels
        );
    }

    if !asset.diagnostics.is_empty() {
        println!("Diagnostics ({}):", asset.diagnostics.len());
        for diagnostic in &asset.diagnostics {
            println!("  {diagnostic}");
        }
    }
}

fn print_bones(asset: ModelAsset, active: usize, time: f32) {
    let ModelAsset {
        mut graph,
        skin,
        animations,
        ..
    } = asset;
    let mut animator = Animator::new(animations, active);
    animator.set_time(time);
    animator.apply(&mut graph);
    graph.update_hierarchy();

    println!("Bone matrices at {:.3}s:", animator.current_time());
    let count = skin.as_ref().map_or(0, |skin| skin.len());
    for (bone, matrix) in joint_matrices(&graph, skin.as_ref())
        .iter()
        .take(count)
        .enumerate()
    {
        println!("  bone {bone}:");
        print_matrix(matrix);
    }
}

fn print_matrix(matrix: &Mat4) {
    // rows, so translation reads down the last column
    let rows = matrix.transpose().to_cols_array_2d();
    for row in rows {
        println!(
            "    [{:>9.4} {:>9.4} {:>9.4} {:>9.4}]",
            row[0], row[1], row[2], row[3]
        );
    }
}
