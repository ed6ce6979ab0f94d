//! Two rooms separated by a wall, plus the outside space.
//!
//! Runs the full extraction and prints every boundary with its level,
//! layers and opposite link.
//!
//! Usage:
//! ```text
//! cargo run --example two_rooms
//! RUST_LOG=parclose=debug cargo run --example two_rooms
//! ```

use parclose::geometry::Solid;
use parclose::math::{Point3, Vector3};
use parclose::model::ElementKind;
use parclose::pipeline::{self, Config, Diagnostics, ElementInput, SpaceInput};

fn box_solid(origin: (f64, f64, f64), size: (f64, f64, f64)) -> Solid {
    let (x, y, z) = origin;
    let (dx, dy, _) = size;
    let base = vec![
        Point3::new(x, y, z),
        Point3::new(x + dx, y, z),
        Point3::new(x + dx, y + dy, z),
        Point3::new(x, y + dy, z),
    ];
    Solid::from_extrusion(base, Vector3::z(), size.2)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Default: WARN for everything, INFO for parclose.
    // Override with RUST_LOG env var (e.g. RUST_LOG=parclose=debug).
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into())
        .add_directive("parclose=info".parse().unwrap_or_default());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let elements = vec![ElementInput {
        name: "wall".into(),
        kind: ElementKind::Wall,
        material: 3,
        solid: box_solid((4.0, 0.0, 0.0), (0.2, 3.0, 2.5)),
    }];
    let spaces = vec![
        SpaceInput {
            name: "room-a".into(),
            solid: box_solid((0.0, 0.0, 0.0), (4.0, 3.0, 2.5)),
            is_outside: false,
        },
        SpaceInput {
            name: "room-b".into(),
            solid: box_solid((4.2, 0.0, 0.0), (4.0, 3.0, 2.5)),
            is_outside: false,
        },
        SpaceInput {
            name: "outside".into(),
            solid: Solid::from_faces(Vec::new()),
            is_outside: true,
        },
    ];

    let config = Config {
        verbose_blocks: true,
        verbose_stacks: true,
        verbose_levels: true,
        ..Config::default()
    };
    let mut diagnostics = Diagnostics::new().on_warn(Box::new(|m| eprintln!("warning: {m}")));
    let result = pipeline::run(&config, elements, spaces, &mut diagnostics)?;

    println!("status: {:?}", result.status);
    for boundary in &result.boundaries {
        let element = boundary.element.as_deref().unwrap_or("-");
        let level = boundary
            .level
            .map_or_else(|| "?".into(), |l| l.to_string());
        let opposite = boundary.opposite.as_deref().unwrap_or("-");
        println!(
            "{:>6}  space={:<8} element={:<8} level={} external={} layers={:?} opposite={}",
            boundary.id, boundary.space, element, level, boundary.is_external, boundary.layers, opposite
        );
    }

    println!();
    let counts = &result.summary.global;
    println!(
        "levels: 2-ext={} 2-int={} 3={} 4={} 5={} virtual={}",
        counts.two_external,
        counts.two_internal,
        counts.three,
        counts.four,
        counts.five,
        counts.virtuals
    );
    for (space, counts) in &result.summary.per_space {
        println!("  {space}: {} boundaries", counts.total());
    }
    Ok(())
}
