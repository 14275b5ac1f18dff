use glam::{DVec2, DVec3, Vec4};
use graph_view::geometry::Rect;
use graph_view::metrics::{Lengths, Units};
use graph_view::model::{Attributes, ColorAttr};
use graph_view::render::DrawCommand;
use graph_view::style::{ElementKind, FillMode, IconMode, NodeShape, Style, StyleGroup};
use graph_view::{ElementKey, GraphRenderer, GraphicGraph, IconManager, RenderList, RendererConfig};
use tracing::Level;

fn summarize(list: &RenderList) -> String {
    let (mut shapes, mut lines, mut images, mut texts) = (0, 0, 0, 0);
    for command in list.iter() {
        match command {
            DrawCommand::Fill { .. } | DrawCommand::Stroke { .. } | DrawCommand::Clear { .. } => shapes += 1,
            DrawCommand::Line { .. } | DrawCommand::Bezier { .. } => lines += 1,
            DrawCommand::Image { .. } => images += 1,
            DrawCommand::Text { .. } => texts += 1,
        }
    }
    format!("{} commands ({shapes} shapes, {lines} lines, {images} images, {texts} texts)", list.len())
}

fn build_graph() -> anyhow::Result<GraphicGraph> {
    let mut graph = GraphicGraph::new();

    let cities = graph.add_style_group(
        StyleGroup::new(
            "cities",
            ElementKind::Node,
            Style {
                fill_mode: FillMode::DynPlain,
                fill_colors: vec![Vec4::new(0.2, 0.4, 1.0, 1.0), Vec4::new(1.0, 0.3, 0.2, 1.0)],
                size: Lengths::gu([8.0]),
                ..Style::default()
            },
        )
        .with_z_index(1)
        .with_event_style(
            "clicked",
            Style {
                shape: NodeShape::Diamond,
                fill_colors: vec![Vec4::new(0.0, 0.8, 0.0, 1.0)],
                size: Lengths::gu([10.0]),
                ..Style::default()
            },
        ),
    );
    let roads = graph.add_style_group(StyleGroup::new(
        "roads",
        ElementKind::Edge,
        Style {
            fill_colors: vec![Vec4::new(0.3, 0.3, 0.3, 1.0)],
            icon: IconMode::Dynamic,
            size: Lengths::px([12.0]),
            padding: Lengths::px([2.0]),
            ..Style::default()
        },
    ));
    let markers = graph.add_style_group(
        StyleGroup::new(
            "markers",
            ElementKind::Sprite,
            Style {
                shape: NodeShape::Box,
                size: Lengths::px([6.0]),
                ..Style::default()
            },
        )
        .with_z_index(2),
    );

    let positions = [("Lyon", -40.0, 10.0), ("Paris", 0.0, 60.0), ("Nice", 50.0, -30.0), ("Brest", -90.0, 55.0)];
    let mut nodes = Vec::new();
    for (i, (id, x, y)) in positions.iter().enumerate() {
        let node = graph.add_node(*id, cities, DVec3::new(*x, *y, 0.0))?;
        graph.set_label(ElementKey::Node(node), *id)?;
        graph.set_attributes(
            ElementKey::Node(node),
            Attributes {
                color: Some(ColorAttr::Value(i as f64 / 3.0)),
                ..Attributes::default()
            },
        )?;
        nodes.push(node);
    }

    // Two parallel roads share one line and one icon panel
    let icons = ["truck", "train", "bike"];
    for (i, (from, to)) in [(0, 1), (1, 0), (1, 2), (0, 3)].iter().enumerate() {
        let edge = graph.add_edge(format!("road-{i}"), nodes[*from], nodes[*to], true, roads)?;
        graph.set_attributes(
            ElementKey::Edge(edge),
            Attributes {
                icon: Some(icons[i % icons.len()].to_string()),
                ..Attributes::default()
            },
        )?;
    }
    let last = graph.add_edge("road-curved", nodes[2], nodes[3], false, roads)?;
    graph.set_control_points(last, Some([DVec2::new(10.0, -80.0), DVec2::new(-80.0, -60.0)]))?;

    let pin = graph.add_sprite("pin", markers, DVec3::new(0.0, 12.0, 0.0), Units::Px)?;
    graph.attach_sprite_to_node(pin, nodes[1])?;
    graph.add_sprite("legend", markers, DVec3::new(95.0, 5.0, 0.0), Units::Percents)?;

    Ok(graph)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::DEBUG).init();

    println!("=== GraphView Headless Demo ===");

    let mut icons = IconManager::new();
    for name in ["truck", "train", "bike", "right-arrow-next"] {
        icons.register(name, 32, 32);
    }

    let mut renderer = GraphRenderer::new(RendererConfig::default(), Box::new(icons));
    renderer.open(build_graph()?)?;

    let (width, height) = (800.0, 600.0);
    for frame in 0..6 {
        println!("\n--- Frame {frame} ---");

        match frame {
            1 => {
                println!(">> Zooming to 50% around Paris...");
                if let Some(camera) = renderer.camera_mut() {
                    camera.set_view_center(0.0, 60.0, 0.0);
                    camera.set_view_percent(0.5);
                }
            }
            2 => {
                println!(">> Rotating by 30 degrees...");
                if let Some(camera) = renderer.camera_mut() {
                    camera.set_view_rotation(30.0);
                }
            }
            3 => {
                println!(">> Clicking on Lyon...");
                if let Some(camera) = renderer.camera_mut() {
                    camera.reset_view();
                }
                // Hit-testing needs the transform of the previous frame
                let mut list = RenderList::new();
                renderer.render(&mut list, 0.0, 0.0, width, height)?;
                if let Some(graph) = renderer.graph() {
                    if let (Some(lyon), Some(camera)) = (graph.find("Lyon"), renderer.camera()) {
                        let p = camera.transform_gu_to_px(DVec3::new(-40.0, 10.0, 0.0));
                        let hit = renderer.find_element_at(p.x, p.y);
                        println!("   Hit at ({:.1}, {:.1}): {:?} (expected {:?})", p.x, p.y, hit, lyon);
                    }
                }
                if let Some(graph) = renderer.graph_mut() {
                    if let Some(lyon) = graph.find("Lyon") {
                        graph.push_event(lyon, "clicked")?;
                    }
                }
            }
            4 => {
                println!(">> Dragging Nice and selecting the upper half...");
                let nice = renderer.graph().and_then(|g| g.find("Nice"));
                if let Some(nice) = nice {
                    let moved = renderer.move_element_at_pixel(nice, 700.0, 500.0)?;
                    println!("   Nice moved to {moved:?}");
                }
                renderer.begin_selection_at(0.0, 0.0);
                renderer.selection_grows_at(width, height / 2.0);
            }
            5 => {
                let area = renderer.end_selection_at(width, height / 2.0);
                if let Some(area) = area {
                    let selected: Vec<&str> = renderer
                        .all_elements_in(area)
                        .into_iter()
                        .filter_map(|key| renderer.graph().and_then(|g| g.element_id(key)))
                        .collect();
                    println!(">> Selected {selected:?}");
                }
                let everything = Rect::new(DVec2::ZERO, DVec2::new(width, height));
                println!("   {} elements on screen", renderer.all_elements_in(everything).len());
            }
            _ => {}
        }

        let mut list = RenderList::new();
        renderer.render(&mut list, 0.0, 0.0, width, height)?;
        println!("  {}", summarize(&list));
    }

    let stats = renderer.stats();
    println!("\n{} frames, last {:?}, average {:.1} fps", stats.frames, stats.last_frame, stats.average_fps());
    println!("Demo Complete.");
    Ok(())
}
