//! # Trajectory Control Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use veh_if::mission::Goal;
use veh_lib::{
    loc::Pose,
    loco_ctrl::{LocoCtrl, Params as LocoCtrlParams},
    traj_ctrl::{Params, TrajCtrl},
};

fn traj_ctrl_benchmark(c: &mut Criterion) {
    // ---- Build a controller part way to a goal ----

    let mut goal = Goal::new(1200.0, 2400.0, 270.0);
    goal.stop_on_contact = true;

    let pose = Pose::new(300.0, 150.0, 10.0);

    let mut traj_ctrl = TrajCtrl::new(Params::default());
    traj_ctrl.begin_goal(goal, &pose, 0).unwrap();

    let mut loco_ctrl = LocoCtrl::new(LocoCtrlParams::default());

    // ---- Benchmark one tick ----

    let mut now_ms = 0;

    c.bench_function("traj_ctrl tick", |b| {
        b.iter(|| {
            now_ms += 1;

            let (cmd, _) = traj_ctrl
                .proc(black_box(&pose), black_box(2000.0), now_ms)
                .unwrap();

            if let Some(cmd) = cmd {
                black_box(loco_ctrl.proc(&cmd));
            }
        })
    });
}

criterion_group!(benches, traj_ctrl_benchmark);
criterion_main!(benches);
