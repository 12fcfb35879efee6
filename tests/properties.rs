//! Invariants that must hold for any population at any tick.

use assert_approx_eq::assert_approx_eq;
use contagion::prelude::*;
use rustc_hash::FxHashSet as HashSet;

fn busy_config(seed: u64) -> PopulationConfig {
    PopulationConfig {
        bounds: Bounds::new((0.0, 40.0), (0.0, 40.0)),
        agent_count: 200,
        popular_places: vec![Point::new(10.0, 10.0), Point::new(30.0, 25.0)],
        initial_infected_fraction: 0.1,
        agent_parameters: AgentParameters {
            infect_probability: 0.2,
            ..AgentParameters::default()
        },
        random_seed: seed,
        ..PopulationConfig::default()
    }
}

fn assert_index_consistent(population: &Population) {
    let index = population.spatial_index();
    assert_eq!(index.len(), population.agents().len());
    for agent in population.agents() {
        let cell = index.cell_key(agent.position());
        assert_eq!(index.cell_of(agent.id()), Some(cell));
        let hits = index
            .members(cell)
            .iter()
            .filter(|member| **member == agent.id())
            .count();
        assert_eq!(hits, 1, "{} must appear exactly once", agent.id());
    }
}

#[test]
fn index_tracks_every_agent() {
    let mut population = Population::from_config(&busy_config(1)).unwrap();
    assert_index_consistent(&population);
    for _ in 0..50 {
        population.step(1);
        assert_index_consistent(&population);
    }
}

#[test]
fn agents_stay_inside_bounds() {
    let mut population = Population::from_config(&busy_config(2)).unwrap();
    for _ in 0..30 {
        population.step(3);
        let bounds = population.region().bounds;
        assert!(population
            .agents()
            .iter()
            .all(|agent| bounds.contains(agent.position())));
    }
}

#[test]
fn infection_is_monotonic() {
    let mut population = Population::from_config(&busy_config(3)).unwrap();
    let mut infected: HashSet<AgentId> = HashSet::default();
    let mut last_count = 0;
    for _ in 0..100 {
        population.step(1);
        for agent in population.agents() {
            if infected.contains(&agent.id()) {
                assert_eq!(agent.status(), InfectionStatus::Infected);
            }
            if agent.is_infected() {
                infected.insert(agent.id());
            }
        }
        let count = population.infected_count();
        assert!(count >= last_count);
        last_count = count;
    }
    assert!(last_count > 0);
}

#[test]
fn infection_times_never_change() {
    let mut population = Population::from_config(&busy_config(4)).unwrap();
    population.step(20);
    let before: Vec<Option<f64>> = population
        .agents()
        .iter()
        .map(|agent| agent.time_infected())
        .collect();
    population.step(40);
    for (agent, time) in population.agents().iter().zip(before) {
        if time.is_some() {
            assert_eq!(agent.time_infected(), time);
        }
        if let Some(t) = agent.time_infected() {
            assert!(t <= population.current_time());
        }
    }
}

#[test]
fn transmissions_match_new_infections() {
    let mut population = Population::from_config(&busy_config(5)).unwrap();
    let seeded = population.infected_count() as u64;
    population.step(80);
    // Every infection after t=0 was caused by exactly one transmission
    assert_eq!(
        population.total_transmissions(),
        population.infected_count() as u64 - seeded
    );
}

#[test]
fn query_radius_never_misses_a_neighbor() {
    let mut population = Population::from_config(&busy_config(6)).unwrap();
    population.step(15);
    let index = population.spatial_index();
    let centers = [
        Point::new(0.0, 0.0),
        Point::new(20.0, 20.0),
        Point::new(39.5, 3.3),
    ];
    for center in centers {
        for radius in [0.0, 0.7, 2.0, 5.5] {
            let found: HashSet<AgentId> = index.query_radius(center, radius).into_iter().collect();
            for agent in population.agents() {
                let p = agent.position();
                let distance = ((p.x - center.x).powi(2) + (p.y - center.y).powi(2)).sqrt();
                if distance <= radius {
                    assert!(found.contains(&agent.id()), "{} missed", agent.id());
                }
            }
        }
    }
}

#[test]
fn statistics_agree_with_snapshot() {
    let mut population = Population::from_config(&busy_config(7)).unwrap();
    population.step(25);
    let snapshot = population.snapshot();
    let infected = snapshot.agents.iter().filter(|agent| agent.infected).count();
    assert_approx_eq!(snapshot.infected_percent, 100.0 * infected as f64 / 200.0);
    assert_approx_eq!(
        snapshot.reproduction_ratio,
        population.total_transmissions() as f64 / infected as f64
    );
}

#[test]
fn snapshot_does_not_mutate() {
    let population = Population::from_config(&busy_config(8)).unwrap();
    let first = population.snapshot();
    let second = population.snapshot();
    assert_eq!(first, second);
    assert_approx_eq!(population.current_time(), 0.0);
}

#[test]
fn different_seeds_diverge() {
    let mut first = Population::from_config(&busy_config(9)).unwrap();
    let mut second = Population::from_config(&busy_config(10)).unwrap();
    first.step(10);
    second.step(10);
    assert_ne!(first.snapshot().agents, second.snapshot().agents);
}
