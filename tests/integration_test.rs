//! End-to-end exercises of the public API: a full training loop against a
//! toy paddle environment, instrumentation, and checkpoint resume.

use ndarray::Array1;

use pong_rl::agent::{Controller, DqnAgent, InstrumentedAgent, TabularAgent};
use pong_rl::config::{AgentConfig, TabularConfig};
use pong_rl::metrics::{MetricSink, MetricsTracker};
use pong_rl::snapshot::{GameSnapshot, RewardShaping};

/// Minimal stand-in for the game: the ball bounces vertically, the paddle
/// moves with the chosen action, and a reward fires whenever the paddle is
/// tracking the ball. Enough dynamics to drive the whole training pipeline.
struct ToyPong {
    snapshot: GameSnapshot,
    shaping: RewardShaping,
}

impl ToyPong {
    fn new() -> Self {
        ToyPong {
            snapshot: GameSnapshot {
                ball_x: 400.0,
                ball_y: 250.0,
                ball_vx: 5.0,
                ball_vy: 3.0,
                paddle_y: 250.0,
                paddle_vy: 0.0,
            },
            shaping: RewardShaping::default(),
        }
    }

    /// Advance one tick; actions are 0 = up, 1 = stay, 2 = down.
    fn step(&mut self, action: usize) -> (GameSnapshot, f32, bool) {
        let mut s = self.snapshot;
        s.paddle_vy = match action {
            0 => -6.0,
            1 => 0.0,
            _ => 6.0,
        };
        s.paddle_y = (s.paddle_y + s.paddle_vy).clamp(0.0, 500.0);
        s.ball_x += s.ball_vx;
        s.ball_y += s.ball_vy;
        if s.ball_y <= 0.0 || s.ball_y >= 500.0 {
            s.ball_vy = -s.ball_vy;
        }

        let mut reward = 0.0;
        let mut done = false;
        if s.ball_x >= 800.0 {
            if (s.paddle_y - s.ball_y).abs() < 60.0 {
                reward = self.shaping.hit;
                s.ball_vx = -s.ball_vx;
            } else {
                reward = self.shaping.loss;
                done = true;
            }
            s.ball_x = 799.0;
        } else if s.ball_x <= 0.0 {
            reward = self.shaping.win;
            done = true;
        }

        self.snapshot = s;
        (s, reward, done)
    }

    fn reset(&mut self) {
        *self = ToyPong::new();
    }
}

#[test]
fn dqn_training_loop_runs_end_to_end() {
    let config = AgentConfig {
        hidden_dim: 16,
        batch_size: 8,
        buffer_size: 512,
        target_update: 50,
        epsilon_decay: 0.99,
        ..AgentConfig::default()
    };
    let mut agent = DqnAgent::new(config).unwrap();
    let mut env = ToyPong::new();

    let mut state = env.snapshot.observation();
    for _ in 0..300 {
        let action = agent.select_action(state.view()).unwrap();
        let (next, reward, done) = env.step(action);
        let next_obs = next.observation();
        agent.remember(state, action, reward, next_obs.clone(), done);
        let loss = agent.optimize().unwrap();
        assert!(loss.is_finite());
        if done {
            env.reset();
            state = env.snapshot.observation();
        } else {
            state = next_obs;
        }
    }

    // The buffer passed batch_size well before the end, so steps advanced
    // and exploration decayed along with them.
    assert!(agent.steps > 200);
    assert!(agent.epsilon < agent.config.epsilon_start);
    assert_eq!(agent.replay_len(), 300);
}

#[test]
fn instrumented_training_produces_metric_series() {
    let config = AgentConfig {
        hidden_dim: 8,
        batch_size: 4,
        buffer_size: 128,
        ..AgentConfig::default()
    };
    let agent = DqnAgent::new(config).unwrap();
    let mut agent = InstrumentedAgent::new(agent, MetricsTracker::new(500));
    let mut env = ToyPong::new();

    let mut state = env.snapshot.observation();
    for _ in 0..50 {
        let action = agent.select_action(state.view()).unwrap();
        let (next, reward, done) = env.step(action);
        let next_obs = next.observation();
        agent.remember(state, action, reward, next_obs.clone(), done);
        agent.optimize().unwrap();
        state = if done {
            env.reset();
            env.snapshot.observation()
        } else {
            next_obs
        };
    }

    assert_eq!(agent.sink().series("loss").unwrap().len(), 50);
    assert_eq!(agent.sink().latest("buffer_size"), Some(50.0));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.json");
    agent.sink().save(path.to_str().unwrap()).unwrap();
    assert!(path.exists());
}

#[test]
fn checkpoint_resume_continues_training() {
    let config = AgentConfig {
        hidden_dim: 8,
        batch_size: 4,
        buffer_size: 64,
        ..AgentConfig::default()
    };
    let mut agent = DqnAgent::new(config).unwrap();
    for i in 0..16 {
        let state = Array1::from_elem(6, i as f32 * 0.05);
        let next = Array1::from_elem(6, (i + 1) as f32 * 0.05);
        agent.remember(state, i % 3, 1.0, next, false);
        agent.optimize().unwrap();
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("agent.ckpt");
    agent.save(&path).unwrap();

    let mut resumed = DqnAgent::load(&path).unwrap();
    assert_eq!(resumed.steps, agent.steps);
    assert_eq!(resumed.epsilon, agent.epsilon);
    assert_eq!(resumed.replay_len(), 0);

    // A resumed agent trains on from where it stopped.
    for i in 0..8 {
        let state = Array1::from_elem(6, i as f32 * 0.05);
        let next = Array1::from_elem(6, (i + 1) as f32 * 0.05);
        resumed.remember(state, i % 3, 0.5, next, false);
        let loss = resumed.optimize().unwrap();
        assert!(loss.is_finite());
    }
    assert_eq!(resumed.steps, agent.steps + 8);
}

#[test]
fn tabular_agent_plays_the_same_loop() {
    let mut agent = TabularAgent::new(TabularConfig::default()).unwrap();
    let mut env = ToyPong::new();

    let mut bins = agent.discretize(&env.snapshot);
    for _ in 0..500 {
        let action = agent.select_action(bins);
        let (next, reward, done) = env.step(action);
        let next_bins = agent.discretize(&next);
        agent.update(bins, action, reward, next_bins);
        if reward != 0.0 {
            agent.decay_epsilon();
        }
        bins = if done {
            env.reset();
            agent.discretize(&env.snapshot)
        } else {
            next_bins
        };
    }

    assert!(agent.epsilon < 1.0);
    let snap = env.snapshot;
    let state = agent.discretize(&snap);
    assert!(agent.greedy_action(state) < 3);
}

#[test]
fn controllers_run_behind_one_interface() {
    let mut dqn = DqnAgent::new(AgentConfig {
        hidden_dim: 8,
        batch_size: 4,
        buffer_size: 32,
        ..AgentConfig::default()
    })
    .unwrap();
    let mut tabular = TabularAgent::new(TabularConfig::default()).unwrap();
    let controllers: [&mut dyn Controller; 2] = [&mut dqn, &mut tabular];

    let observation = GameSnapshot {
        ball_x: 120.0,
        ball_y: 300.0,
        ball_vx: -4.0,
        ball_vy: 2.0,
        paddle_y: 100.0,
        paddle_vy: 0.0,
    }
    .observation();

    for controller in controllers {
        let action = controller.select_action(observation.view()).unwrap();
        assert!(action < 3);
        assert!(controller.exploration_rate() <= 1.0);
    }
}
