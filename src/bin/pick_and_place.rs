// Pick-and-place manipulation planning demo
//
// A point robot must move a point object across a workspace with a disc
// obstacle. Two modes: "free" (the robot moves alone) and "carry" (the
// object is attached to the robot). Transitions: transit, grasp,
// carry_move, place. Configurations are [rx, ry, ox, oy].

use std::sync::Arc;

use gnuplot::{AxesCommon, Caption, Color, Figure, PointSize, PointSymbol};

use manipulation_planning::graph::CoordinateLock;
use manipulation_planning::sampling::UniformSampler;
use manipulation_planning::validation::DiscretizedPathValidator;
use manipulation_planning::{
    Configuration, ConstraintOperator, ManipulationPlanner, ModeEdge, ModeGraph, Path, Problem,
    Roadmap, SteeringMethod, TransitionGraph,
};

// Parameters
const WORLD_MIN: f64 = 0.0; // workspace bound [m]
const WORLD_MAX: f64 = 10.0; // workspace bound [m]
const OBSTACLE_CENTER: (f64, f64) = (5.0, 5.0);
const OBSTACLE_RADIUS: f64 = 1.5; // [m]
const GRASP_TOLERANCE: f64 = 1e-6;
const RESOLUTION: f64 = 0.2; // collision checking resolution [m]
const MAX_STEPS: usize = 2000;

fn robot(c: &Configuration) -> (f64, f64) {
    (c.0[0], c.0[1])
}

fn object(c: &Configuration) -> (f64, f64) {
    (c.0[2], c.0[3])
}

fn holding(c: &Configuration) -> bool {
    let (rx, ry) = robot(c);
    let (ox, oy) = object(c);
    ((rx - ox).powi(2) + (ry - oy).powi(2)).sqrt() <= GRASP_TOLERANCE
}

fn clear_of_obstacle(x: f64, y: f64) -> bool {
    ((x - OBSTACLE_CENTER.0).powi(2) + (y - OBSTACLE_CENTER.1).powi(2)).sqrt() > OBSTACLE_RADIUS
}

fn config_valid(c: &Configuration) -> bool {
    let (rx, ry) = robot(c);
    let (ox, oy) = object(c);
    let inside = |v: f64| (WORLD_MIN..=WORLD_MAX).contains(&v);
    inside(rx)
        && inside(ry)
        && inside(ox)
        && inside(oy)
        && clear_of_obstacle(rx, ry)
        && clear_of_obstacle(ox, oy)
}

/// Path constraint of the carry mode: the object rides on the robot.
struct ObjectAttached {
    tolerance: f64,
}

impl ConstraintOperator for ObjectAttached {
    fn offset_from_config(&mut self, _reference: &Configuration) {}

    fn is_satisfied(&self, c: &Configuration) -> bool {
        let (rx, ry) = robot(c);
        let (ox, oy) = object(c);
        ((rx - ox).powi(2) + (ry - oy).powi(2)).sqrt() <= self.tolerance
    }
}

/// Shortcut steering that never teleports the object: straight paths are
/// allowed only when the object stays put or is carried at both ends.
struct ManipulationSteering;

impl SteeringMethod for ManipulationSteering {
    fn steer(&self, from: &Configuration, to: &Configuration) -> Option<Path> {
        let (x1, y1) = object(from);
        let (x2, y2) = object(to);
        let object_still = ((x1 - x2).powi(2) + (y1 - y2).powi(2)).sqrt() <= 1e-9;
        let carried = holding(from) && holding(to);
        if object_still || carried {
            Some(Path::straight(from.clone(), to.clone()))
        } else {
            None
        }
    }
}

fn build_graph() -> ModeGraph {
    let mut graph = ModeGraph::new();
    let free = graph.add_state("free", |c| !holding(c));
    let carry = graph.add_state("carry", holding);

    // the robot moves alone, the object stays where it is
    graph.add_edge(
        ModeEdge::new("transit", free, free)
            .with_weight(3.0)
            .with_project(|reference, target| {
                Some(Configuration::new(vec![
                    target.0[0],
                    target.0[1],
                    reference.0[2],
                    reference.0[3],
                ]))
            })
            .with_constraint(|| Box::new(CoordinateLock::new(vec![2, 3], GRASP_TOLERANCE))),
    );
    // the robot approaches the object and grasps it
    graph.add_edge(
        ModeEdge::new("grasp", free, carry)
            .with_project(|reference, _target| {
                let (ox, oy) = object(reference);
                Some(Configuration::new(vec![ox, oy, ox, oy]))
            })
            .with_constraint(|| Box::new(CoordinateLock::new(vec![2, 3], GRASP_TOLERANCE))),
    );
    // the object follows the robot
    graph.add_edge(
        ModeEdge::new("carry_move", carry, carry)
            .with_weight(3.0)
            .with_project(|_reference, target| {
                let (rx, ry) = robot(target);
                Some(Configuration::new(vec![rx, ry, rx, ry]))
            })
            .with_constraint(|| {
                Box::new(ObjectAttached {
                    tolerance: GRASP_TOLERANCE,
                })
            }),
    );
    // the robot releases the object and backs away
    graph.add_edge(
        ModeEdge::new("place", carry, free)
            .with_project(|reference, target| {
                let (ox, oy) = object(reference);
                Some(Configuration::new(vec![target.0[0], target.0[1], ox, oy]))
            })
            .with_constraint(|| Box::new(CoordinateLock::new(vec![2, 3], GRASP_TOLERANCE))),
    );
    graph
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();
    println!("Pick and place planning start!");

    let graph: Arc<dyn TransitionGraph> = Arc::new(build_graph());
    let sampler = UniformSampler::seeded(
        Configuration::new(vec![WORLD_MIN; 4]),
        Configuration::new(vec![WORLD_MAX; 4]),
        42,
    )
    .unwrap();
    let validator = DiscretizedPathValidator::new(RESOLUTION, config_valid);
    let problem = Problem::new(
        Arc::clone(&graph),
        Box::new(sampler),
        Box::new(ManipulationSteering),
        Box::new(validator),
    );

    let mut roadmap = Roadmap::new(Arc::clone(&graph));
    // robot at (1,1), object at (7,7); goal: object moved to (9,3)
    let start = roadmap.add_node(Configuration::new(vec![1.0, 1.0, 7.0, 7.0]));
    let goal = roadmap.add_node(Configuration::new(vec![1.0, 1.0, 9.0, 3.0]));

    let mut planner = ManipulationPlanner::new(problem, roadmap).unwrap();

    println!("Growing roadmap...");
    let mut solved_at = None;
    for step in 1..=MAX_STEPS {
        planner.one_step();
        if planner.roadmap().can_reach(start, goal) {
            solved_at = Some(step);
            break;
        }
        if step % 200 == 0 {
            println!(
                "  step {}: {} nodes, {} components",
                step,
                planner.roadmap().node_count(),
                planner.roadmap().connected_components().len()
            );
        }
    }
    match solved_at {
        Some(step) => println!("Start and goal connected after {} steps!", step),
        None => println!("No connection after {} steps", MAX_STEPS),
    }

    println!("Extension statistics:");
    for (_, stats) in planner.statistics().iter() {
        println!("  {}", stats);
    }

    // Visualization: robot-space projection of the roadmap
    let roadmap = planner.roadmap();
    let node_x: Vec<f64> = roadmap
        .node_ids()
        .map(|n| roadmap.configuration(n).0[0])
        .collect();
    let node_y: Vec<f64> = roadmap
        .node_ids()
        .map(|n| roadmap.configuration(n).0[1])
        .collect();
    let circle_x: Vec<f64> = (0..=60)
        .map(|i| {
            OBSTACLE_CENTER.0 + OBSTACLE_RADIUS * (i as f64 * std::f64::consts::TAU / 60.0).cos()
        })
        .collect();
    let circle_y: Vec<f64> = (0..=60)
        .map(|i| {
            OBSTACLE_CENTER.1 + OBSTACLE_RADIUS * (i as f64 * std::f64::consts::TAU / 60.0).sin()
        })
        .collect();

    let mut fig = Figure::new();
    let axes = fig.axes2d();
    axes.set_title("Pick and Place Roadmap", &[])
        .set_x_label("x [m]", &[])
        .set_y_label("y [m]", &[])
        .set_aspect_ratio(gnuplot::AutoOption::Fix(1.0));
    for edge in roadmap.edges() {
        let path = edge.path();
        let (t0, t1) = path.time_range();
        let samples = 20;
        let xs: Vec<f64> = (0..=samples)
            .map(|i| path.eval(t0 + (t1 - t0) * i as f64 / samples as f64).0[0])
            .collect();
        let ys: Vec<f64> = (0..=samples)
            .map(|i| path.eval(t0 + (t1 - t0) * i as f64 / samples as f64).0[1])
            .collect();
        axes.lines(&xs, &ys, &[Color("lightgray")]);
    }
    axes.lines(&circle_x, &circle_y, &[Caption("Obstacle"), Color("black")])
        .points(
            &node_x,
            &node_y,
            &[
                Caption("Roadmap"),
                Color("gray"),
                PointSymbol('.'),
                PointSize(1.0),
            ],
        )
        .points(
            &[1.0],
            &[1.0],
            &[
                Caption("Robot start"),
                Color("blue"),
                PointSymbol('O'),
                PointSize(2.0),
            ],
        )
        .points(
            &[7.0],
            &[7.0],
            &[
                Caption("Object start"),
                Color("green"),
                PointSymbol('O'),
                PointSize(2.0),
            ],
        )
        .points(
            &[9.0],
            &[3.0],
            &[
                Caption("Object goal"),
                Color("red"),
                PointSymbol('O'),
                PointSize(2.0),
            ],
        );

    fig.save_to_svg("pick_and_place.svg", 640, 480).unwrap();
    println!("Plot saved to pick_and_place.svg");

    println!("Done!");
}
