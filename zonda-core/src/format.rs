//! Markdown rendering of reports and the bot's static replies.

use crate::model::Report;

pub const MONITORED_ZONES: &[&str] =
    &["El Salto", "Valle del Sol", "Las Carditas", "Dique Potrerillos"];

pub const SENSORS_UNAVAILABLE: &str = "❌ Los sensores meteorológicos no están disponibles \
en este momento.\nAnte cualquier emergencia llamá al **911**.";

pub const EMERGENCY_CONTACTS: &str = "🚨 **CONTACTOS DE EMERGENCIA**\n\n\
📞 **Emergencias:** 911\n\
📞 **Defensa Civil Mendoza:** 103\n\
📞 **Centro de Salud Potrerillos:** 02624 48-2003\n\n\
⚠️ *Si hay crecida de arroyos, no intentes cruzar badenes.*";

pub const ZONDA_TIPS: &str = "📝 **CONSEJOS ANTE VIENTO ZONDA**\n\
1. Hidratarse permanentemente.\n\
2. Cerrar y asegurar puertas y ventanas.\n\
3. **PROHIBIDO** encender fuego al aire libre.\n\
4. Evitar transitar bajo árboles o cables eléctricos.";

pub const UNRECOGNIZED: &str = "🤔 No reconozco esa opción. Usá los botones del menú \
para consultar el estado o los contactos de emergencia.";

/// Escape characters that Telegram's legacy Markdown treats as entity
/// delimiters, so user or provider text can't break message parsing.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

pub fn onboarding(display_name: Option<&str>) -> String {
    let greeting = match display_name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => format!("Hola {}.", escape_markdown(name)),
        None => "Hola.".to_string(),
    };

    format!(
        "{greeting} Soy el **Monitor de Emergencias Potrerillos**.\n\n\
         Mi misión es brindarte información crítica sobre el clima en {}.\n\
         Utiliza los botones inferiores para obtener reportes en tiempo real.",
        join_zones()
    )
}

fn join_zones() -> String {
    match MONITORED_ZONES.split_last() {
        Some((last, rest)) if !rest.is_empty() => format!("{} y {last}", rest.join(", ")),
        Some((last, _)) => (*last).to_string(),
        None => String::new(),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Render a report as a Markdown message for the location named `location`.
pub fn render_report(report: &Report, location: &str) -> String {
    const RULE: &str = "------------------------------------";
    let r = &report.reading;

    let mut out = format!(
        "📊 **REPORTE DE ESTADO - {}**\n{RULE}\n",
        escape_markdown(&location.to_uppercase())
    );
    out.push_str(&format!("🌡️ **Temperatura:** {:.1}°C\n", r.temperature_c));
    out.push_str(&format!("🌬️ **Viento:** {:.1} km/h\n", r.wind_speed_kph));
    out.push_str(&format!("💨 **Ráfagas:** {:.1} km/h\n", r.wind_gust_kph));
    if let Some(humidity) = r.humidity_pct {
        out.push_str(&format!("💧 **Humedad:** {humidity:.0}%\n"));
    }
    if let Some(pressure) = r.pressure_hpa {
        out.push_str(&format!("🧭 **Presión:** {pressure:.0} hPa\n"));
    }
    out.push_str(&format!(
        "☁️ **Condición:** {}\n\n",
        escape_markdown(&capitalize(&r.condition))
    ));
    out.push_str(&format!(
        "{} **Alerta Activa:** {}\n{RULE}\n",
        report.tier.emoji(),
        report.tier.label()
    ));
    out.push_str(&format!("📍 **Zonas Monitoreadas:** {}.\n\n", MONITORED_ZONES.join(", ")));
    out.push_str(&report.advisory);
    out.push_str(&format!(
        "\n\n🕒 _Actualizado: {} UTC_",
        r.observation_time.format("%d/%m %H:%M")
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{alert::AlertPolicy, model::WeatherReading};
    use chrono::{TimeZone, Utc};

    fn sample(humidity: Option<f64>) -> WeatherReading {
        WeatherReading {
            temperature_c: 18.0,
            wind_speed_kph: 20.04,
            wind_gust_kph: 60.0,
            humidity_pct: humidity,
            pressure_hpa: humidity.map(|_| 1011.6),
            condition: "despejado".to_string(),
            observation_time: Utc.with_ymd_and_hms(2026, 1, 5, 14, 30, 0).unwrap(),
        }
    }

    #[test]
    fn report_embeds_values_tier_and_zones() {
        let report = AlertPolicy::zonda().classify(sample(Some(20.0)));
        let text = render_report(&report, "Potrerillos, Mendoza");

        assert!(text.contains("REPORTE DE ESTADO - POTRERILLOS, MENDOZA"));
        assert!(text.contains("18.0°C"));
        assert!(text.contains("20.0 km/h"));
        assert!(text.contains("60.0 km/h"));
        assert!(text.contains("**Humedad:** 20%"));
        assert!(text.contains("1012 hPa"));
        assert!(text.contains("Despejado"));
        assert!(text.contains("ALERTA ZONDA"));
        assert!(text.contains("Las Carditas"));
        assert!(text.contains("PROHIBIDO encender fuego"));
        assert!(text.contains("05/01 14:30 UTC"));
    }

    #[test]
    fn report_omits_absent_humidity_and_pressure() {
        let report = AlertPolicy::zonda().classify(sample(None));
        let text = render_report(&report, "Potrerillos");

        assert!(!text.contains("Humedad"));
        assert!(!text.contains("Presión"));
    }

    #[test]
    fn onboarding_greets_by_name() {
        let text = onboarding(Some("Ana"));
        assert!(text.starts_with("Hola Ana."));
        assert!(text.contains("El Salto, Valle del Sol, Las Carditas y Dique Potrerillos"));
    }

    #[test]
    fn onboarding_escapes_markdown_in_name() {
        let text = onboarding(Some("juan_perez"));
        assert!(text.starts_with("Hola juan\\_perez."));

        let text = onboarding(Some("*[`x"));
        assert!(text.starts_with("Hola \\*\\[\\`x."));
    }

    #[test]
    fn report_escapes_provider_condition() {
        let mut reading = sample(Some(40.0));
        reading.condition = "nubes_dispersas *fuertes*".to_string();
        let report = AlertPolicy::zonda().classify(reading);
        let text = render_report(&report, "Potrerillos");

        assert!(text.contains("Nubes\\_dispersas \\*fuertes\\*"));
    }

    #[test]
    fn escape_leaves_plain_text_untouched() {
        assert_eq!(escape_markdown("Lucía Pérez"), "Lucía Pérez");
    }

    #[test]
    fn onboarding_without_name() {
        assert!(onboarding(Some("  ")).starts_with("Hola. Soy"));
        assert!(onboarding(None).starts_with("Hola. Soy"));
    }
}
