// src/visualisation.rs

use crate::error::{SimError, SimResult};
use crate::sweep::SweepReport;
use crate::vector_field::VectorField3D;
use plotters::prelude::*;
use std::path::Path;

type DrawResult = Result<(), Box<dyn std::error::Error>>;

fn plot_err(e: Box<dyn std::error::Error>) -> SimError {
    SimError::Plot(e.to_string())
}

/// Map m_z ∈ [-1, 1] to blue–white–red.
fn mz_to_color(mz: f64) -> RGBColor {
    let x = (0.5 * (mz + 1.0)).clamp(0.0, 1.0);
    let r = (255.0 * x) as u8;
    let b = (255.0 * (1.0 - x)) as u8;
    let g = (255.0 * (1.0 - 2.0 * (x - 0.5).abs())).clamp(0.0, 255.0) as u8;
    RGBColor(r, g, b)
}

/// Save the m_z component of the z = `k` layer as a PNG; cells outside `mask` are grey.
pub fn save_mz_slice_plot(field: &VectorField3D, mask: &[bool], k: usize, path: &Path) -> SimResult<()> {
    if k >= field.grid.nz {
        return Err(SimError::Plot(format!(
            "slice {} out of range (nz={})",
            k, field.grid.nz
        )));
    }
    draw_mz_slice(field, mask, k, path).map_err(plot_err)
}

fn draw_mz_slice(field: &VectorField3D, mask: &[bool], k: usize, path: &Path) -> DrawResult {
    let nx = field.grid.nx as i32;
    let ny = field.grid.ny as i32;

    let root = BitMapBackend::new(path, (800, 800)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(40)
        .caption(
            format!("m_z, layer k={} (blue = -1, white = 0, red = +1)", k),
            ("sans-serif", 20),
        )
        .x_label_area_size(40)
        .y_label_area_size(40)
        .build_cartesian_2d(0..nx, 0..ny)?;

    chart
        .configure_mesh()
        .x_desc("x (cell index)")
        .y_desc("y (cell index)")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    chart.draw_series((0..nx).flat_map(|i| {
        (0..ny).map(move |j| {
            let idx = field.idx(i as usize, j as usize, k);
            let color = if mask[idx] {
                mz_to_color(field.data[idx][2])
            } else {
                RGBColor(200, 200, 200)
            };
            Rectangle::new([(i, j), (i + 1, j + 1)], color.filled())
        })
    }))?;

    root.present()?;
    Ok(())
}

/// Plot |<m>|, core m_z and shell m_z against temperature.
pub fn save_m_vs_t_plot(report: &SweepReport, path: &Path) -> SimResult<()> {
    if report.points.is_empty() {
        return Ok(());
    }
    draw_m_vs_t(report, path).map_err(plot_err)
}

fn draw_m_vs_t(report: &SweepReport, path: &Path) -> DrawResult {
    let temps = report.temperatures();
    let mut t_min = temps.iter().cloned().fold(f64::INFINITY, f64::min);
    let mut t_max = temps.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if t_max - t_min < 1e-9 {
        t_min -= 1.0;
        t_max += 1.0;
    }

    let root = BitMapBackend::new(path, (1024, 768)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .caption("Reduced magnetisation vs temperature", ("sans-serif", 30))
        .set_left_and_bottom_label_area_size(60)
        .build_cartesian_2d(t_min..t_max, -1.1..1.1)?;

    chart
        .configure_mesh()
        .x_desc("temperature (K)")
        .y_desc("reduced magnetisation")
        .draw()?;

    let series: [(&str, RGBColor, Box<dyn Fn(&crate::sweep::SweepPoint) -> f64>); 3] = [
        ("|<m>|", BLACK, Box::new(|p| p.m_norm)),
        ("core m_z", RED, Box::new(|p| p.core_m[2])),
        ("shell m_z", BLUE, Box::new(|p| p.shell_m[2])),
    ];

    for (label, color, value) in series.iter() {
        let color = *color;
        chart
            .draw_series(LineSeries::new(
                report.points.iter().map(|p| (p.temperature, value(p))),
                &color,
            ))?
            .label(*label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &color));
        chart.draw_series(
            report
                .points
                .iter()
                .map(|p| Circle::new((p.temperature, value(p)), 3, color.filled())),
        )?;
    }

    chart
        .configure_series_labels()
        .border_style(&BLACK)
        .background_style(&WHITE.mix(0.8))
        .draw()?;

    root.present()?;
    Ok(())
}
