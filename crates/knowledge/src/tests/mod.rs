mod retrieval_ranking;
