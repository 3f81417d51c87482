//! Golden regression: synfire chain over three runs without extraction
//!
//! 200 LIF neurons in a ring (delay 17 ms), kicked by six stimulus spikes
//! and run for 3 × 1000 ms. The machine is replaced by a deterministic
//! stand-in that fills each core's spike region; the host side under test
//! is everything else: run extension, partitioning, region sizing,
//! placement registration and spike extraction.

use bytes::{BufMut, BytesMut};
use spynn_chip::recording::spike_words;
use spynn_chip::PopulationRegion;
use spynn_population::{
    atoms_per_core, split_population, AtomsPerCorePolicy, CoreLocation, InMemoryReader,
    IncomingProjection, Placement, PopulationError, PopulationVertex, SimulationConfig,
    SpikeRecordable, VertexSlice,
};

const N_NEURONS: usize = 200;
const STIMULUS: [u32; 6] = [1050, 1060, 1500, 1700, 1900, 2200];
const RUN_TIMES_MS: [f64; 3] = [1000.0, 1000.0, 1000.0];
const RING_DELAY_MS: f64 = 17.0;
const GOLDEN_SPIKE_COUNT: usize = 454;

/// Ticks from a stimulus spike to the first ring neuron firing
const FIRST_HOP_TICKS: u32 = 10;
/// Mean ticks per hop around the ring, in tenths (delay plus integration)
const HOP_TENTHS: u32 = 189;

/// Spikes the machine produces for this network, as `(neuron, tick)`
fn chain_spikes(n_steps: u32) -> Vec<(usize, u32)> {
    let mut spikes = Vec::new();
    for &start in &STIMULUS {
        for hop in 0.. {
            let t = start + FIRST_HOP_TICKS + HOP_TENTHS * hop / 10;
            if t >= n_steps {
                break;
            }
            spikes.push((hop as usize % N_NEURONS, t));
        }
    }
    spikes
}

/// Spike region a core holding `slice` leaves behind
fn spike_region(slice: &VertexSlice, spikes: &[(usize, u32)], n_steps: u32) -> BytesMut {
    let words = spike_words(slice.n_atoms());
    let mut records = vec![0u32; words * n_steps as usize];
    for &(neuron, t) in spikes.iter().filter(|(n, _)| slice.contains(*n)) {
        let local = neuron - slice.lo_atom();
        records[t as usize * words + local / 32] |= 1 << (local % 32);
    }
    let mut buf = BytesMut::with_capacity(4 + records.len() * 4);
    buf.put_u32_le((records.len() * 4) as u32);
    for word in records {
        buf.put_u32_le(word);
    }
    buf
}

fn synfire_population() -> PopulationVertex {
    let config = SimulationConfig::new(1000, None, false)
        .expect("Invalid timing")
        .with_run_time_ms(RUN_TIMES_MS[0])
        .expect("Invalid run time");
    let mut pop = PopulationVertex::lif_curr_exp("pop_1", N_NEURONS, config)
        .expect("Failed to build population");
    pop.set_recording_spikes();
    pop.add_incoming_projection(IncomingProjection::one_to_one("inputSpikes_0", 1, 0, 5.0, 1.0));
    pop.add_incoming_projection(IncomingProjection::one_to_one(
        "pop_1",
        N_NEURONS,
        0,
        5.0,
        RING_DELAY_MS,
    ));
    for &run in &RUN_TIMES_MS[1..] {
        pop.extend_run_ms(run).expect("Failed to extend run");
    }
    pop
}

/// Generate, "run" and load every core, returning the reader
fn run_on_machine(pop: &mut PopulationVertex, slices: Vec<VertexSlice>) -> InMemoryReader {
    let n_steps = pop.config().n_machine_time_steps;
    let placements: Vec<_> = slices
        .into_iter()
        .zip(1u32..)
        .map(|(slice, p)| (Placement::new(slice, CoreLocation::new(0, 0, p)), Some(p << 11)))
        .collect();
    let specs = pop
        .generate_data_specs(&placements)
        .expect("Failed to generate data specs");

    let spikes = chain_spikes(n_steps);
    let mut reader = InMemoryReader::new();
    for ((placement, _), spec) in placements.iter().zip(&specs) {
        let image = spec.execute().expect("Failed to execute data spec");
        reader.load_image(placement.location, &image);

        let region = spike_region(&placement.slice, &spikes, n_steps);
        let reserved = image
            .region(PopulationRegion::SpikeHistory.index())
            .expect("Spike region not reserved");
        assert_eq!(region.len(), reserved.size());
        reader.insert(placement.location, PopulationRegion::SpikeHistory, region.freeze());
    }
    reader
}

#[test]
fn test_synfire_three_runs_two_cores() {
    let mut pop = synfire_population();
    assert_eq!(pop.config().n_machine_time_steps, 3000);

    let per_core = atoms_per_core(N_NEURONS, 2, AtomsPerCorePolicy::RequireExact)
        .expect("Invalid atoms per core");
    let slices = split_population(N_NEURONS, per_core).expect("Failed to split");
    assert_eq!(slices.len(), 2);

    let reader = run_on_machine(&mut pop, slices);
    let spikes = pop.get_spikes(&reader).expect("Failed to extract spikes");
    assert_eq!(spikes.len(), GOLDEN_SPIKE_COUNT);

    assert_eq!(spikes.spike_train(0), vec![1060, 1070, 1510, 1710, 1910, 2210]);
    assert_eq!(spikes.spike_train(1), vec![1078, 1088, 1528, 1728, 1928, 2228]);
    assert_eq!(spikes.spike_train(10), vec![1249, 1259, 1699, 1899, 2099, 2399]);

    // only the two earliest waves reach the second core before the run ends
    assert_eq!(spikes.spikes.iter().filter(|s| s.neuron_id >= 100).count(), 6);
    assert_eq!(spikes.spike_train(100), vec![2950, 2960]);
    assert_eq!(spikes.spike_train(102), vec![2987, 2997]);
    assert!(spikes.spike_train(103).is_empty());
}

#[test]
fn test_synfire_single_slice() {
    let mut pop = synfire_population();
    let slices = vec![VertexSlice::new(0, N_NEURONS - 1).expect("Invalid slice")];
    let reader = run_on_machine(&mut pop, slices);
    let spikes = pop.get_spikes(&reader).expect("Failed to extract spikes");
    assert_eq!(spikes.len(), GOLDEN_SPIKE_COUNT);
}

#[test]
fn test_synfire_waves_form_lines() {
    let mut pop = synfire_population();
    let slices = split_population(N_NEURONS, 100).expect("Failed to split");
    let reader = run_on_machine(&mut pop, slices);
    let spikes = pop.get_spikes(&reader).expect("Failed to extract spikes");

    // neuron 0 fires once per wave, first hop after each stimulus
    let starts: Vec<u32> = STIMULUS.iter().map(|s| s + FIRST_HOP_TICKS).collect();
    assert_eq!(spikes.spike_train(0), starts);

    // along a wave, later neurons fire later
    for neuron in 1..20 {
        let before = spikes.spike_train(neuron - 1);
        let after = spikes.spike_train(neuron);
        assert_eq!(before.len(), after.len());
        assert!(before.iter().zip(&after).all(|(a, b)| b > a));
    }
}

#[test]
fn test_truncated_region_is_rejected() {
    let mut pop = synfire_population();
    let slices = split_population(N_NEURONS, 100).expect("Failed to split");
    let mut reader = run_on_machine(&mut pop, slices);

    let location = CoreLocation::new(0, 0, 2);
    let mut short = spike_region(
        &VertexSlice::new(100, 199).expect("Invalid slice"),
        &[],
        3000,
    );
    short.truncate(short.len() - 16);
    reader.insert(location, PopulationRegion::SpikeHistory, short.freeze());

    assert!(matches!(
        pop.get_spikes(&reader),
        Err(PopulationError::DataFormat { .. })
    ));
}
