#![allow(clippy::missing_docs_in_private_items)]
#![allow(clippy::arithmetic_side_effects)]
#![allow(clippy::indexing_slicing)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]

use djb2_table::{Table, TableStats};
use plotters::prelude::*;
use rand::{Rng, distr::Alphanumeric, seq::SliceRandom};

// Keys inserted before the removal phase starts
const NUM_KEYS: usize = 20_000;
// Record a sample every this many operations
const SAMPLE_EVERY: usize = 50;

struct Sample {
    op: usize,
    load_factor: f64,
    bucket_count: usize,
    longest_chain: usize,
}

fn random_key(rng: &mut impl Rng) -> String {
    let len = rng.random_range(4..24);
    rng.sample_iter(&Alphanumeric).take(len).map(char::from).collect()
}

fn sample(op: usize, stats: &TableStats, load_factor: f64) -> Sample {
    Sample { op, load_factor, bucket_count: stats.bucket_count, longest_chain: stats.longest_chain }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = rand::rng();
    let mut keys: Vec<String> = (0..NUM_KEYS).map(|_| random_key(&mut rng)).collect();
    keys.sort_unstable();
    keys.dedup();
    keys.shuffle(&mut rng);

    println!("Inserting {} distinct keys, then removing them in random order", keys.len());

    let mut table = Table::try_new()?;
    let mut samples: Vec<Sample> = Vec::new();
    let mut op = 0;

    // Insert phase
    for (i, key) in keys.iter().enumerate() {
        table.set(key, i as i32)?;
        op += 1;
        if op % SAMPLE_EVERY == 0 {
            samples.push(sample(op, &table.stats(), table.load_factor()));
        }
    }

    let peak = table.stats();
    let peak_chains: Vec<usize> = table.chain_lengths().collect();
    println!(
        "  Peak: {} entries, {} buckets, load factor {:.3}, longest chain {}, empty buckets {}",
        peak.len,
        peak.bucket_count,
        table.load_factor(),
        peak.longest_chain,
        peak.empty_buckets
    );

    // Removal phase
    keys.shuffle(&mut rng);
    for key in &keys {
        table.remove(key);
        op += 1;
        if op % SAMPLE_EVERY == 0 {
            samples.push(sample(op, &table.stats(), table.load_factor()));
        }
    }

    let end = table.stats();
    println!("  End: {} entries, {} buckets", end.len, end.bucket_count);

    let font_family = "sans-serif";
    let text_size = 16;
    let title_size = 35;
    let line_width = 2;

    // Plot 1: load factor and bucket count over time
    let root = BitMapBackend::new("load_factor_trace.png", (1200, 900)).into_drawing_area();
    root.fill(&WHITE)?;
    let areas = root.split_evenly((2, 1));

    let max_op = samples.last().map_or(1, |s| s.op);
    let max_load = samples.iter().map(|s| s.load_factor).fold(0.0, f64::max) * 1.1;

    let mut load_chart = ChartBuilder::on(&areas[0])
        .caption("Load Factor per Operation", (font_family, title_size))
        .margin(15)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .build_cartesian_2d(0..max_op, 0.0..max_load.max(1.6))?;

    load_chart
        .configure_mesh()
        .x_desc("Operations (inserts, then removals)")
        .y_desc("Entries per bucket")
        .axis_desc_style((font_family, text_size))
        .draw()?;

    let load_style = ShapeStyle::from(&RGBColor(50, 90, 220)).stroke_width(line_width);
    load_chart
        .draw_series(LineSeries::new(samples.iter().map(|s| (s.op, s.load_factor)), load_style))?
        .label("Load factor")
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], load_style));

    // Grow and shrink thresholds
    for (threshold, label) in [
        (table.config().grow_load_factor(), "Grow threshold"),
        (table.config().shrink_load_factor(), "Shrink threshold"),
    ] {
        let style = ShapeStyle::from(&RED.mix(0.4)).stroke_width(1);
        load_chart
            .draw_series(LineSeries::new(vec![(0, threshold), (max_op, threshold)], style))?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
    }

    load_chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .position(SeriesLabelPosition::UpperRight)
        .draw()?;

    let max_buckets = samples.iter().map(|s| s.bucket_count).max().unwrap_or(1);
    let max_chain = samples.iter().map(|s| s.longest_chain).max().unwrap_or(1);

    let mut bucket_chart = ChartBuilder::on(&areas[1])
        .caption("Bucket Count and Longest Chain", (font_family, title_size))
        .margin(15)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .right_y_label_area_size(60)
        .build_cartesian_2d(0..max_op, 0..max_buckets + max_buckets / 10)?
        .set_secondary_coord(0..max_op, 0..max_chain + 1);

    bucket_chart
        .configure_mesh()
        .x_desc("Operations (inserts, then removals)")
        .y_desc("Buckets")
        .axis_desc_style((font_family, text_size))
        .draw()?;
    bucket_chart
        .configure_secondary_axes()
        .y_desc("Longest chain")
        .axis_desc_style((font_family, text_size))
        .draw()?;

    let bucket_style = ShapeStyle::from(&RGBColor(50, 180, 50)).stroke_width(line_width);
    bucket_chart
        .draw_series(LineSeries::new(samples.iter().map(|s| (s.op, s.bucket_count)), bucket_style))?
        .label("Bucket count")
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], bucket_style));

    let chain_style = ShapeStyle::from(&RGBColor(180, 50, 180)).stroke_width(1);
    bucket_chart
        .draw_secondary_series(LineSeries::new(
            samples.iter().map(|s| (s.op, s.longest_chain)),
            chain_style,
        ))?
        .label("Longest chain")
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], chain_style));

    bucket_chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .position(SeriesLabelPosition::UpperRight)
        .draw()?;

    // Plot 2: chain length histogram at peak occupancy
    let mut histogram = vec![0usize; peak.longest_chain + 1];
    for &length in &peak_chains {
        histogram[length] += 1;
    }
    for (length, count) in histogram.iter().enumerate() {
        println!("  chains of length {length}: {count}");
    }

    let root = BitMapBackend::new("chain_lengths.png", (1200, 800)).into_drawing_area();
    root.fill(&WHITE)?;

    let max_count = histogram.iter().copied().max().unwrap_or(1);
    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("Chain Lengths at Peak ({} entries, {} buckets)", peak.len, peak.bucket_count),
            (font_family, title_size),
        )
        .margin(15)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .build_cartesian_2d((0..peak.longest_chain + 1).into_segmented(), 0..max_count + max_count / 10)?;

    chart
        .configure_mesh()
        .x_desc("Chain length")
        .y_desc("Buckets")
        .axis_desc_style((font_family, text_size))
        .draw()?;

    chart.draw_series(
        Histogram::vertical(&chart)
            .style(RGBColor(50, 90, 220).filled())
            .margin(4)
            .data(histogram.iter().enumerate().map(|(length, &count)| (length, count))),
    )?;

    println!("Generated plot images: load_factor_trace.png, chain_lengths.png");

    Ok(())
}
