use crate::engines::generation::genome::{Chromosome, Individual, SearchSpace};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeMap;

/// Tournament selection: pick best of K random candidates
pub fn tournament_selection<'a, R: Rng>(
    population: &'a [Individual],
    tournament_size: usize,
    rng: &mut R,
) -> &'a Individual {
    let mut best_idx = rng.gen_range(0..population.len());
    let mut best_fitness = population[best_idx].score();

    for _ in 1..tournament_size {
        let idx = rng.gen_range(0..population.len());
        if population[idx].score() > best_fitness {
            best_idx = idx;
            best_fitness = population[idx].score();
        }
    }

    &population[best_idx]
}

/// Roulette wheel selection: probability proportional to fitness
pub fn roulette_selection<'a, R: Rng>(population: &'a [Individual], rng: &mut R) -> &'a Individual {
    let total_fitness: f64 = population.iter().map(|ind| ind.score().max(0.0)).sum();

    if total_fitness <= 0.0 {
        // Nothing scored yet (or every candidate failed), pick random
        return &population[rng.gen_range(0..population.len())];
    }

    let mut spin = rng.gen::<f64>() * total_fitness;

    for individual in population {
        spin -= individual.score().max(0.0);
        if spin <= 0.0 {
            return individual;
        }
    }

    // Fallback
    &population[population.len() - 1]
}

/// Linear rank selection: weight n for the best down to 1 for the worst.
///
/// Unlike roulette this keeps pressure constant when scores are bunched
/// (e.g. every candidate sitting around 60% accuracy) and never gives the
/// worst candidate zero probability.
pub fn rank_selection<'a, R: Rng>(population: &'a [Individual], rng: &mut R) -> &'a Individual {
    let n = population.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        population[b]
            .score()
            .partial_cmp(&population[a].score())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let total = n * (n + 1) / 2;
    let mut spin = rng.gen_range(0..total);
    for (position, &idx) in order.iter().enumerate() {
        let weight = n - position;
        if spin < weight {
            return &population[idx];
        }
        spin -= weight;
    }

    &population[order[n - 1]]
}

/// Uniform crossover: each gene comes from either parent with p = 0.5.
///
/// Genes are walked in the first parent's key order; a gene missing from
/// the second parent is inherited from the first.
pub fn uniform_crossover<R: Rng>(parent1: &Chromosome, parent2: &Chromosome, rng: &mut R) -> Chromosome {
    let genes = parent1
        .genes
        .iter()
        .map(|(name, value)| {
            let chosen = match parent2.genes.get(name) {
                Some(other) if rng.gen_bool(0.5) => other.clone(),
                _ => value.clone(),
            };
            (name.clone(), chosen)
        })
        .collect();

    Chromosome::new(genes)
}

/// Mutation: replace each gene with a fresh draw with probability `mutation_rate`
pub fn mutate<R: Rng>(chromosome: &mut Chromosome, mutation_rate: f64, search_space: &SearchSpace, rng: &mut R) {
    for (name, gene) in chromosome.genes.iter_mut() {
        if rng.gen::<f64>() < mutation_rate {
            if let Some(value) = search_space.values(name).and_then(|values| values.choose(rng)) {
                *gene = value.clone();
            }
        }
    }
    chromosome.accuracy = None;
}

/// Sample a chromosome uniformly, independently per parameter
pub fn random_chromosome<R: Rng>(search_space: &SearchSpace, rng: &mut R) -> Chromosome {
    let genes: BTreeMap<_, _> = search_space
        .iter()
        .filter_map(|(name, values)| values.choose(rng).map(|v| (name.clone(), v.clone())))
        .collect();

    Chromosome::new(genes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ParamValue;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn individual(a: i64, fitness: f64) -> Individual {
        let mut genes = BTreeMap::new();
        genes.insert("a".to_string(), ParamValue::Integer(a));
        Individual {
            chromosome: Chromosome::new(genes),
            fitness: Some(fitness),
        }
    }

    #[test]
    fn test_tournament_favors_fitter() {
        let population = vec![individual(0, 1.0), individual(1, 90.0)];
        let mut rng = StdRng::seed_from_u64(7);

        let wins = (0..1000)
            .filter(|_| tournament_selection(&population, 3, &mut rng).score() == 90.0)
            .count();

        // Weak one only wins when drawn three times in a row (1/8)
        assert!(wins > 800, "fitter individual won only {} times", wins);
        assert!(wins < 1000, "weaker individual was never selected");
    }

    #[test]
    fn test_roulette_all_zero_picks_uniformly() {
        let population = vec![individual(0, 0.0), individual(1, 0.0), individual(2, 0.0)];
        let mut rng = StdRng::seed_from_u64(11);

        let mut seen = [false; 3];
        for _ in 0..200 {
            let picked = roulette_selection(&population, &mut rng);
            seen[picked.chromosome.get_i64("a").unwrap() as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_rank_selection_keeps_worst_reachable() {
        let population = vec![individual(0, 50.0), individual(1, 10.0), individual(2, 30.0)];
        let mut rng = StdRng::seed_from_u64(3);

        let mut counts = [0usize; 3];
        for _ in 0..6000 {
            let picked = rank_selection(&population, &mut rng);
            counts[picked.chromosome.get_i64("a").unwrap() as usize] += 1;
        }

        // Expected shares 3/6, 1/6, 2/6
        assert!(counts[0] > counts[2]);
        assert!(counts[2] > counts[1]);
        assert!(counts[1] > 0);
    }

    #[test]
    fn test_uniform_crossover_takes_genes_from_parents() {
        let space = SearchSpace::new()
            .with_param("a", [1i64, 2])
            .with_param("b", [1i64, 2])
            .with_param("c", [1i64, 2]);
        let mut p1 = Chromosome::default();
        let mut p2 = Chromosome::default();
        for (name, _) in space.iter() {
            p1.genes.insert(name.clone(), ParamValue::Integer(1));
            p2.genes.insert(name.clone(), ParamValue::Integer(2));
        }
        let mut rng = StdRng::seed_from_u64(5);

        let mut mixed = false;
        for _ in 0..50 {
            let child = uniform_crossover(&p1, &p2, &mut rng);
            assert_eq!(child.genes.len(), 3);
            assert!(child.accuracy.is_none());
            let ones = child.genes.values().filter(|v| **v == ParamValue::Integer(1)).count();
            if ones > 0 && ones < 3 {
                mixed = true;
            }
        }
        assert!(mixed);
    }

    #[test]
    fn test_mutate_rate_zero_and_one() {
        let space = SearchSpace::new().with_param("a", [5i64]).with_param("b", [6i64]);
        let mut rng = StdRng::seed_from_u64(1);

        let mut chromosome = Chromosome::default();
        chromosome.genes.insert("a".to_string(), ParamValue::Integer(1));
        chromosome.genes.insert("b".to_string(), ParamValue::Integer(1));

        let mut untouched = chromosome.clone();
        mutate(&mut untouched, 0.0, &space, &mut rng);
        assert_eq!(untouched.get_i64("a"), Some(1));

        mutate(&mut chromosome, 1.0, &space, &mut rng);
        assert_eq!(chromosome.get_i64("a"), Some(5));
        assert_eq!(chromosome.get_i64("b"), Some(6));
    }

    #[test]
    fn test_random_chromosome_covers_every_param() {
        let space = SearchSpace::new()
            .with_param("lr", [0.01, 0.1])
            .with_param("n_columns", [2i64, 3, 4]);
        let mut rng = StdRng::seed_from_u64(9);

        let chromosome = random_chromosome(&space, &mut rng);
        assert_eq!(chromosome.genes.len(), 2);
        assert!(space.values("n_columns").unwrap().contains(chromosome.get("n_columns").unwrap()));
    }
}
