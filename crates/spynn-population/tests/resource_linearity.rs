//! Resource estimates grow linearly with the atoms on a core

use spynn_population::resources::neuron_params_bytes;
use spynn_population::{
    IncomingProjection, PopulationVertex, ResourceContainer, SimulationConfig, SpikeRecordable,
    VertexSlice, VoltageRecordable,
};

fn population(record: bool) -> PopulationVertex {
    let config = SimulationConfig::new(1000, None, false)
        .expect("Invalid timing")
        .with_run_time_ms(500.0)
        .expect("Invalid run time");
    let mut pop =
        PopulationVertex::lif_curr_exp("pop_1", 1024, config).expect("Failed to build population");
    if record {
        pop.set_recording_spikes();
        pop.set_recording_v(1);
    }
    pop.add_incoming_projection(IncomingProjection::one_to_one("pop_1", 1024, 0, 5.0, 17.0));
    pop
}

fn required(pop: &PopulationVertex, n_atoms: usize) -> ResourceContainer {
    let slice = VertexSlice::new(0, n_atoms - 1).expect("Invalid slice");
    pop.resources_required(&slice)
}

fn step(pop: &PopulationVertex, from: usize, to: usize) -> (u64, usize, usize) {
    let a = required(pop, from);
    let b = required(pop, to);
    (
        b.cpu_cycles - a.cpu_cycles,
        b.dtcm_bytes - a.dtcm_bytes,
        b.sdram_bytes - a.sdram_bytes,
    )
}

#[test]
fn test_estimate_is_affine_in_atoms() {
    let pop = population(false);
    for k in [1, 7, 32, 100] {
        assert_eq!(step(&pop, k, 2 * k), step(&pop, 2 * k, 3 * k), "k = {k}");
    }
}

#[test]
fn test_recording_stays_affine_on_whole_spike_words() {
    let pop = population(true);
    for k in [32, 64, 128] {
        assert_eq!(step(&pop, k, 2 * k), step(&pop, 2 * k, 3 * k), "k = {k}");
    }
}

#[test]
fn test_recording_costs_more() {
    let quiet = population(false);
    let loud = population(true);
    let (a, b) = (required(&quiet, 100), required(&loud, 100));
    assert!(b.sdram_bytes > a.sdram_bytes);
    assert!(b.cpu_cycles > a.cpu_cycles);
}

#[test]
fn test_neuron_params_per_neuron() {
    let pop = population(false);
    let model = pop.model_costs();
    let one = neuron_params_bytes(pop.cost_table(), &model, 1);
    let hundred = neuron_params_bytes(pop.cost_table(), &model, 100);
    assert_eq!(hundred - one, 99 * model.param_bytes_per_neuron);
}

#[test]
fn test_small_slice_fits_on_core() {
    let pop = population(true);
    assert!(pop.fits_on_core(&VertexSlice::new(0, 99).expect("Invalid slice")));
}
