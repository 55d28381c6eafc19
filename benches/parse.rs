use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use std::io::Cursor;

use tidyplate::biotek::PlateReaderStreamer;
use tidyplate::table::TidyTable;
use tidyplate::transforms::{endpoint_average, smoothed_derivative};

const ROWS: [char; 16] = [
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P',
];

/// Generate a kinetic GFP + OD600 export over a full 384-well plate
fn generate_export(time_points: usize) -> Vec<u8> {
    let wells: Vec<String> = ROWS
        .iter()
        .flat_map(|r| (1..=24).map(move |c| format!("{}{}", r, c)))
        .collect();

    let mut export = String::from(
        "Reader Serial Number:,268449\n\
         Read,GFP\n\
         ,Filter Set 1\n\
         ,\"    Excitation: 485/20,  Emission: 528/20\"\n\
         ,\"    Optics: Top,  Gain: 61\"\n\
         Read,OD600\n\
         ,Absorbance Endpoint\n\
         Layout\n\
         Results\n",
    );

    for (label, title, base) in [
        ("GFP:485,528", "\"T° GFP:485,528\"", 1517.0),
        ("OD600:600", "T° OD600:600", 0.05),
    ] {
        export.push_str(&format!("{}\n\n,Time,{},{}\n", label, title, wells.join(",")));
        for t in 0..time_points {
            let seconds = t * 600;
            export.push_str(&format!(
                ",{}:{:02}:{:02},37",
                seconds / 3600,
                (seconds / 60) % 60,
                seconds % 60
            ));
            for (i, _) in wells.iter().enumerate() {
                let value = base * (1.0 + t as f64 * 0.01 + i as f64 * 1e-4);
                export.push_str(&format!(",{}", value));
            }
            export.push('\n');
        }
        export.push('\n');
    }

    export.into_bytes()
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("export_parser_next_row");

    for time_points in [12, 48, 144] {
        let bytes = generate_export(time_points);
        let readings = 2 * 384 * time_points;

        group.throughput(Throughput::Elements(readings as u64));
        group.bench_with_input(BenchmarkId::from_parameter(time_points), &bytes, |b, bytes| {
            b.iter_batched(
                || PlateReaderStreamer::new(Cursor::new(bytes.clone()), 10.0),
                |mut streamer| {
                    let mut count = 0usize;
                    while let Some(row) = streamer.next_row().unwrap() {
                        count += 1;
                        black_box(row.measurement);
                    }
                    black_box(count);
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

fn bench_transforms(c: &mut Criterion) {
    let mut group = c.benchmark_group("series_transforms");

    let rows: Result<Vec<_>, _> = PlateReaderStreamer::new(Cursor::new(generate_export(48)), 10.0)
        .rows()
        .collect();
    let table = TidyTable::from_rows(Vec::new(), rows.unwrap());

    group.throughput(Throughput::Elements(table.len() as u64));
    group.bench_function("endpoint_average", |b| {
        b.iter(|| black_box(endpoint_average(&table, 10, &[]).unwrap()))
    });
    group.bench_function("smoothed_derivative", |b| {
        b.iter(|| black_box(smoothed_derivative(&table, "Measurement", None, &[]).unwrap()))
    });

    group.finish();
}

criterion_group!(benches, bench_parse, bench_transforms);
criterion_main!(benches);
