//! Mapping from hierarchical transport topics to flat series identifiers.

/// Converts an MQTT topic into a series identifier by
/// 1. prepending a `/` if the topic lacks one, so step 3 is uniform,
/// 2. replacing any `.` with `_` (a dot would add an extra level in the
///    destination hierarchy, e.g. the decimal in `PM2.5`),
/// 3. replacing topic level separators (`/`) with series separators (`.`),
/// 4. prepending the configured series prefix verbatim.
///
/// The escaping in step 2 is lossy: two topics that differ only by `.` vs
/// `_` in the same position map to the same identifier. This is a known
/// limitation of the naming scheme, not something to silently repair.
pub fn map_topic(topic: &str, series_prefix: &str) -> String {
    let normalized = if topic.starts_with('/') {
        topic.to_string()
    } else {
        format!("/{topic}")
    };
    format!(
        "{series_prefix}{}",
        normalized.replace('.', "_").replace('/', ".")
    )
}

/// Final path segment of a raw transport topic, naming the measurement kind
/// (e.g. "temperature"). For a topic without separators the whole topic is
/// the kind.
pub fn measurement_kind(topic: &str) -> &str {
    topic.rsplit('/').next().unwrap_or(topic)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_topic_escapes_dots() {
        assert_eq!(
            map_topic("/test/topic/PM2.5", "root.devdb"),
            "root.devdb.test.topic.PM2_5"
        );
        assert_eq!(
            map_topic("/t.e.s.t/t.o.p.i.c/P.M.2.5.", "root.devdb"),
            "root.devdb.t_e_s_t.t_o_p_i_c.P_M_2_5_"
        );
    }

    #[test]
    fn test_map_topic_normalizes_missing_slash() {
        assert_eq!(
            map_topic("nostartingslash", "root.devdb"),
            "root.devdb.nostartingslash"
        );
    }

    #[test]
    fn test_map_topic_segment_count() {
        let mapped = map_topic("/loc1/src2/temperature", "root.devdb");
        assert_eq!(mapped, "root.devdb.loc1.src2.temperature");
        assert_eq!(mapped.split('.').count(), 5);
    }

    #[test]
    fn test_measurement_kind() {
        assert_eq!(measurement_kind("/test/topic/PM2.5"), "PM2.5");
        assert_eq!(measurement_kind("/a"), "a");
        assert_eq!(measurement_kind("/"), "");
        assert_eq!(measurement_kind("bare"), "bare");
    }

    #[test]
    fn test_escaping_collision_is_accepted() {
        // Documented lossiness: the pair collides by design.
        assert_eq!(
            map_topic("/a/b.c", "root.devdb"),
            map_topic("/a/b_c", "root.devdb")
        );
    }
}
